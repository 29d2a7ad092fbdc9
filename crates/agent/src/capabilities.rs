//! Capability seams the pipeline requires from its environment.
//!
//! Embedding, classification and extraction are network-backed models in a
//! full deployment; the pipeline only depends on these traits. Deterministic
//! local implementations live next to the stages that use them
//! (`retrieval::HashingEmbedder`, `extractor::RuleBasedExtractor`), so the
//! whole pipeline also runs without any remote capability configured.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use porcher_core::config::PipelineConfig;
use porcher_core::{ActionKind, CapabilityError};

/// Text to dense-vector capability used by the retrieval matcher.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CapabilityError>;
}

/// Output of the classification capability. `action: None` means the model
/// abstained.
#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    pub action: Option<ActionKind>,
    pub confidence: f64,
}

/// External intent classification capability. The `hint`, when present, is
/// a few-shot style nudge from an earlier stage, never an override: the
/// classifier remains free to return a different action.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        text: &str,
        hint: Option<ActionKind>,
    ) -> Result<Classification, CapabilityError>;
}

/// Raw extraction output: parameter values as the capability produced them,
/// before the normalizer canonicalizes them at the adapter boundary.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Extraction {
    pub parameters: BTreeMap<String, String>,
    pub confidence: f64,
}

/// External structured-extraction capability for one action's schema.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, text: &str, action: ActionKind)
        -> Result<Extraction, CapabilityError>;
}

/// Timeout and bounded-retry policy applied to every capability call.
///
/// A timed-out or transport-failed call is retried at most
/// `max_retries` times (transient failures only); whatever error remains
/// is the caller's to degrade into "no candidate from this stage".
#[derive(Clone, Copy, Debug)]
pub struct StagePolicy {
    pub timeout: Duration,
    pub max_retries: u32,
}

impl StagePolicy {
    pub fn from_config(pipeline: &PipelineConfig) -> Self {
        Self {
            timeout: Duration::from_millis(pipeline.stage_timeout_ms),
            max_retries: pipeline.max_transport_retries,
        }
    }

    pub async fn call<T, F, Fut>(&self, operation: F) -> Result<T, CapabilityError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, CapabilityError>>,
    {
        let mut attempt = 0;
        loop {
            let outcome = match tokio::time::timeout(self.timeout, operation()).await {
                Ok(result) => result,
                Err(_elapsed) => {
                    Err(CapabilityError::Timeout { timeout_ms: self.timeout.as_millis() as u64 })
                }
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

/// Classifier stand-in for deployments without a remote model: always
/// abstains, which routes every utterance through retrieval and fallback.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopClassifier;

#[async_trait]
impl Classifier for NoopClassifier {
    async fn classify(
        &self,
        _text: &str,
        _hint: Option<ActionKind>,
    ) -> Result<Classification, CapabilityError> {
        Ok(Classification { action: None, confidence: 0.0 })
    }
}
