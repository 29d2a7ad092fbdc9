//! Typed parameter values carried by a decision.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single extracted parameter value, already canonicalized by the
/// normalizer (amounts in FCFA, weights in kilograms, codes in `P<digits>`
/// form).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl ParamValue {
    pub fn integer(value: i64) -> Self {
        Self::Number(value as f64)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Integral numbers print without a trailing `.0` so amounts and
            // head counts render the way the farmer typed them.
            Self::Number(value) if value.fract() == 0.0 => write!(f, "{}", *value as i64),
            Self::Number(value) => write!(f, "{value}"),
            Self::Date(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// Parameter name to value mapping for one decision. Keys belong to the
/// winning action's schema; anything else is dropped at the extractor
/// boundary.
pub type ParameterSet = BTreeMap<String, ParamValue>;

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::ParamValue;

    #[test]
    fn integral_numbers_display_without_fraction() {
        assert_eq!(ParamValue::integer(800_000).to_string(), "800000");
        assert_eq!(ParamValue::Number(50.5).to_string(), "50.5");
    }

    #[test]
    fn untagged_serde_keeps_numbers_and_text_apart() {
        let number: ParamValue = serde_json::from_str("5").expect("number");
        assert_eq!(number.as_number(), Some(5.0));

        let text: ParamValue = serde_json::from_str("\"kouame\"").expect("text");
        assert_eq!(text.as_text(), Some("kouame"));
    }

    #[test]
    fn dates_round_trip_through_serde() {
        let date = ParamValue::Date(NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date"));
        let json = serde_json::to_string(&date).expect("serializable");
        let back: ParamValue = serde_json::from_str(&json).expect("deserializable");
        assert_eq!(back.as_date(), date.as_date());
    }
}
