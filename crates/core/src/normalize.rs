//! Natural-language number, unit and code canonicalization.
//!
//! The farmers this pipeline serves write amounts the way they say them:
//! `800 000`, `800k`, `1 million`, `150 balles` (local slang for thousands),
//! usually with a trailing `fcfa`. The normalizer turns every equivalent
//! phrasing into one canonical value so the rest of the pipeline only ever
//! sees integers, kilograms and `P<digits>` codes.
//!
//! Parsing failures are values, not panics: an unparsable field is reported
//! as missing by the orchestrator instead of aborting the decision.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("no numeric token found in `{0}`")]
    NoNumericToken(String),
}

fn cached(cell: &'static OnceLock<Regex>, pattern: &'static str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("hard-coded pattern compiles"))
}

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"(?i)(\d+(?:[\s,]\d{3})*(?:[.,]\d+)?)\s*(k\b|millions?\b|balles?\b|m\b)?")
}

fn weight_with_unit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"(?i)(\d+(?:\.\d+)?)\s*(?:kg|kilogrammes?|kilos?)\b")
}

fn bare_decimal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"(\d+(?:\.\d+)?)")
}

fn code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"^(?:PORC|ANIMAL|P)?(\d+)$")
}

fn integer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\d+")
}

/// Lowercases, strips French accents, replaces punctuation with spaces and
/// collapses whitespace. Every stage compares utterances in this folded
/// form so `j'ai vendu` and `j ai vendu` are the same sentence.
pub fn fold_text(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for ch in text.to_lowercase().chars() {
        match ch {
            'à' | 'â' | 'ä' => folded.push('a'),
            'é' | 'è' | 'ê' | 'ë' => folded.push('e'),
            'î' | 'ï' => folded.push('i'),
            'ô' | 'ö' => folded.push('o'),
            'ù' | 'û' | 'ü' => folded.push('u'),
            'ç' => folded.push('c'),
            'œ' => folded.push_str("oe"),
            _ if ch.is_ascii_alphanumeric() => folded.push(ch),
            _ => folded.push(' '),
        }
    }
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses an FCFA amount phrase into an integer.
///
/// Accepted forms: plain digits (`800000`), thousands groups with space or
/// comma separators (`800 000`, `800,000`), suffix multipliers `k`/`K`
/// (x1,000), `million(s)`/`M` (x1,000,000) and the slang `balles`
/// (x1,000). Trailing currency tokens (`fcfa`, `cfa`, `francs`) are
/// ignored.
pub fn normalize_amount(text: &str) -> Result<i64, NormalizationError> {
    let captures = amount_re()
        .captures(text)
        .ok_or_else(|| NormalizationError::NoNumericToken(text.to_string()))?;

    let digits = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    let suffix = captures.get(2).map(|m| m.as_str().to_lowercase());

    let multiplier = match suffix.as_deref() {
        Some("k") | Some("balle") | Some("balles") => 1_000.0,
        Some("m") | Some("million") | Some("millions") => 1_000_000.0,
        _ => 1.0,
    };

    // With a multiplier the digits may carry a decimal part (`1,5 million`);
    // without one, separators are thousands groups and are dropped.
    let cleaned = if multiplier > 1.0 {
        digits.split_whitespace().collect::<String>().replace(',', ".")
    } else {
        digits.chars().filter(|c| c.is_ascii_digit()).collect::<String>()
    };

    let value: f64 = cleaned
        .parse()
        .map_err(|_| NormalizationError::NoNumericToken(text.to_string()))?;
    Ok((value * multiplier).round() as i64)
}

/// Parses a weight phrase into kilograms. Decimal weights use `.` or `,`
/// as separator and may carry a `kg` suffix (`50.5 kg` -> 50.5). A number
/// anchored to a weight unit wins over a bare number.
pub fn normalize_weight(text: &str) -> Result<f64, NormalizationError> {
    let lowered = text.to_lowercase().replace(',', ".");

    let captures = weight_with_unit_re()
        .captures(&lowered)
        .or_else(|| bare_decimal_re().captures(&lowered))
        .ok_or_else(|| NormalizationError::NoNumericToken(text.to_string()))?;

    captures
        .get(1)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .ok_or_else(|| NormalizationError::NoNumericToken(text.to_string()))
}

/// Canonicalizes an animal code: whitespace stripped, uppercased, and the
/// word form collapsed to `P<digits>` (`p001` -> `P001`, `porc001` ->
/// `P001`, bare `001` -> `P001`). Idempotent by construction; codes that
/// do not fit the pig numbering scheme are returned uppercased as-is.
pub fn normalize_code(text: &str) -> String {
    let compact: String =
        text.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_uppercase();

    match code_re().captures(&compact) {
        Some(captures) => format!("P{}", &captures[1]),
        None => compact,
    }
}

/// Parses a head count or quantity as a plain integer.
pub fn normalize_count(text: &str) -> Result<i64, NormalizationError> {
    integer_re()
        .find(text)
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .ok_or_else(|| NormalizationError::NoNumericToken(text.to_string()))
}
