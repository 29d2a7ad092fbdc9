//! Decision types produced by the pipeline.
//!
//! A `Decision` is produced fresh for every utterance and never mutated;
//! a newer decision for the same session supersedes the previous one.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::actions::ActionKind;
use crate::params::ParameterSet;

/// Raw user input, immutable once received.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Utterance {
    pub id: Uuid,
    pub session_id: String,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl Utterance {
    pub fn new(session_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
            text: text.into(),
            received_at: Utc::now(),
        }
    }
}

/// Which stage produced the winning candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageSource {
    Classifier,
    Retrieval,
    Fallback,
}

/// A working hypothesis produced by one stage, before thresholds are
/// applied by the orchestrator.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Candidate {
    pub action: ActionKind,
    pub confidence: f64,
    pub source: StageSource,
}

/// Why an utterance ended as `Unrecognized`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnrecognizedReason {
    EmptyUtterance,
    NoUsableCandidate,
    CancelledByUser,
}

impl UnrecognizedReason {
    /// Generic, non-crashing reply shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyUtterance => "Je n'ai rien reçu. Pouvez-vous écrire votre demande ?",
            Self::NoUsableCandidate => {
                "Je n'ai pas compris votre demande. Vous pouvez par exemple dire \
                 \"j'ai vendu 5 porcs à 800 000\" ou \"combien de porcs j'ai\"."
            }
            Self::CancelledByUser => "D'accord, j'annule cette action.",
        }
    }
}

/// Terminal outcome of the pipeline for one utterance.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    /// High confidence and complete parameters: ready to act.
    Executed {
        action: ActionKind,
        parameters: ParameterSet,
        confidence: f64,
        source: StageSource,
    },
    /// Moderate confidence or incomplete parameters: the user must confirm
    /// before any side effect happens. `missing` lists the unresolved
    /// required field names, possibly empty when only confidence is the
    /// issue.
    PendingConfirmation {
        action: ActionKind,
        parameters: ParameterSet,
        missing: Vec<String>,
        confidence: f64,
        source: StageSource,
    },
    /// No stage produced an actionable result.
    Unrecognized { reason: UnrecognizedReason },
}

impl Decision {
    /// Predicted action, `None` for `Unrecognized`. This is what the
    /// monitor compares against ground truth.
    pub fn action(&self) -> Option<ActionKind> {
        match self {
            Self::Executed { action, .. } | Self::PendingConfirmation { action, .. } => {
                Some(*action)
            }
            Self::Unrecognized { .. } => None,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Self::Executed { confidence, .. } | Self::PendingConfirmation { confidence, .. } => {
                *confidence
            }
            Self::Unrecognized { .. } => 0.0,
        }
    }

    pub fn parameters(&self) -> Option<&ParameterSet> {
        match self {
            Self::Executed { parameters, .. } | Self::PendingConfirmation { parameters, .. } => {
                Some(parameters)
            }
            Self::Unrecognized { .. } => None,
        }
    }

    pub fn is_actionable(&self) -> bool {
        !matches!(self, Self::Unrecognized { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::{Decision, StageSource, UnrecognizedReason};
    use crate::actions::ActionKind;
    use crate::params::{ParamValue, ParameterSet};

    fn revenu_params() -> ParameterSet {
        let mut params = ParameterSet::new();
        params.insert("nombre".to_string(), ParamValue::integer(5));
        params.insert("montant".to_string(), ParamValue::integer(800_000));
        params
    }

    #[test]
    fn executed_exposes_action_and_confidence() {
        let decision = Decision::Executed {
            action: ActionKind::CreateRevenu,
            parameters: revenu_params(),
            confidence: 0.92,
            source: StageSource::Retrieval,
        };

        assert_eq!(decision.action(), Some(ActionKind::CreateRevenu));
        assert!(decision.is_actionable());
        assert_eq!(decision.confidence(), 0.92);
    }

    #[test]
    fn unrecognized_is_a_null_prediction() {
        let decision = Decision::Unrecognized { reason: UnrecognizedReason::NoUsableCandidate };
        assert_eq!(decision.action(), None);
        assert_eq!(decision.confidence(), 0.0);
        assert!(decision.parameters().is_none());
        assert!(!decision.is_actionable());
    }

    #[test]
    fn decision_serializes_with_kind_tag() {
        let decision = Decision::PendingConfirmation {
            action: ActionKind::CreatePesee,
            parameters: ParameterSet::new(),
            missing: vec!["poids_kg".to_string()],
            confidence: 0.8,
            source: StageSource::Fallback,
        };

        let json = serde_json::to_value(&decision).expect("serializable");
        assert_eq!(json["kind"], "pending_confirmation");
        assert_eq!(json["action"], "create_pesee");
        assert_eq!(json["missing"][0], "poids_kg");
    }
}
