//! Adapter around the external classification capability.
//!
//! Applies the stage timeout/retry policy and converts the raw
//! `Classification` into a pipeline `Candidate`. Threshold filtering stays
//! with the orchestrator; an abstaining model (`action: None`) is simply no
//! candidate.

use std::sync::Arc;

use porcher_core::{ActionKind, Candidate, CapabilityError, StageSource};

use crate::capabilities::{Classifier, StagePolicy};

pub struct ClassifierAdapter {
    classifier: Arc<dyn Classifier>,
    policy: StagePolicy,
}

impl ClassifierAdapter {
    pub fn new(classifier: Arc<dyn Classifier>, policy: StagePolicy) -> Self {
        Self { classifier, policy }
    }

    /// Classifies the utterance, optionally nudged by a retrieved label.
    /// The hint is contextual, never an override.
    pub async fn classify(
        &self,
        text: &str,
        hint: Option<ActionKind>,
    ) -> Result<Option<Candidate>, CapabilityError> {
        let classification = self.policy.call(|| self.classifier.classify(text, hint)).await?;

        Ok(classification.action.map(|action| Candidate {
            action,
            confidence: classification.confidence,
            source: StageSource::Classifier,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::ClassifierAdapter;
    use crate::capabilities::{Classification, Classifier, StagePolicy};
    use porcher_core::{ActionKind, CapabilityError, StageSource};

    struct ScriptedClassifier {
        action: Option<ActionKind>,
        confidence: f64,
    }

    #[async_trait]
    impl Classifier for ScriptedClassifier {
        async fn classify(
            &self,
            _text: &str,
            hint: Option<ActionKind>,
        ) -> Result<Classification, CapabilityError> {
            // The hint must reach the capability untouched, and must not
            // replace the model's own answer.
            assert_eq!(hint, Some(ActionKind::CreateRevenu));
            Ok(Classification { action: self.action, confidence: self.confidence })
        }
    }

    fn policy() -> StagePolicy {
        StagePolicy { timeout: Duration::from_millis(100), max_retries: 1 }
    }

    #[tokio::test]
    async fn confident_answer_becomes_a_classifier_candidate() {
        let adapter = ClassifierAdapter::new(
            Arc::new(ScriptedClassifier {
                action: Some(ActionKind::CreateDepense),
                confidence: 0.93,
            }),
            policy(),
        );

        let candidate = adapter
            .classify("j ai achete 20 sacs a 18000", Some(ActionKind::CreateRevenu))
            .await
            .expect("capability reachable")
            .expect("model answered");

        assert_eq!(candidate.action, ActionKind::CreateDepense);
        assert_eq!(candidate.confidence, 0.93);
        assert_eq!(candidate.source, StageSource::Classifier);
    }

    #[tokio::test]
    async fn abstention_is_no_candidate() {
        let adapter = ClassifierAdapter::new(
            Arc::new(ScriptedClassifier { action: None, confidence: 0.2 }),
            policy(),
        );

        let candidate = adapter
            .classify("bonjour", Some(ActionKind::CreateRevenu))
            .await
            .expect("capability reachable");
        assert!(candidate.is_none());
    }
}
