//! Pipeline orchestrator.
//!
//! `Start -> {RetrievalDone, ClassificationDone} -> (ExtractionDone)? ->
//! Decided`. Retrieval and classification are issued concurrently and both
//! awaited before stage selection; extraction and fallback only run after
//! selection. Stage order of authority: classifier at or above its floor,
//! else retrieval at or above its floor, else the keyword fallback, else
//! `Unrecognized`.
//!
//! A capability failure degrades its stage to "no candidate" and the
//! pipeline continues; nothing thrown by a stage crosses this boundary.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use porcher_core::config::{AppConfig, ThresholdConfig};
use porcher_core::{
    fold_text, Candidate, Decision, ParameterSet, StageSource, UnrecognizedReason, Utterance,
};

use crate::capabilities::{Classifier, Extractor, StagePolicy};
use crate::classifier::ClassifierAdapter;
use crate::extractor::ExtractorAdapter;
use crate::fallback::FallbackDetector;
use crate::monitor::{GroundTruth, PerformanceMonitor};
use crate::retrieval::{RetrievalMatch, RetrievalMatcher};
use crate::session::{interpret_reply, PendingAction, Reply, SessionStore};

pub struct Orchestrator {
    thresholds: ThresholdConfig,
    critical_amount_fcfa: i64,
    stage_policy: StagePolicy,
    retrieval: RetrievalMatcher,
    classifier: ClassifierAdapter,
    extractor: ExtractorAdapter,
    fallback: FallbackDetector,
    sessions: SessionStore,
    monitor: Arc<PerformanceMonitor>,
}

impl Orchestrator {
    /// All collaborators are injected; the orchestrator owns only the
    /// per-session conversation state.
    pub fn new(
        config: &AppConfig,
        retrieval: RetrievalMatcher,
        classifier: Arc<dyn Classifier>,
        extractor: Arc<dyn Extractor>,
        monitor: Arc<PerformanceMonitor>,
    ) -> Self {
        let stage_policy = StagePolicy::from_config(&config.pipeline);
        Self {
            thresholds: config.thresholds,
            critical_amount_fcfa: config.pipeline.critical_amount_fcfa,
            stage_policy,
            retrieval,
            classifier: ClassifierAdapter::new(classifier, stage_policy),
            extractor: ExtractorAdapter::new(extractor, stage_policy),
            fallback: FallbackDetector,
            sessions: SessionStore::new(),
            monitor,
        }
    }

    pub fn monitor(&self) -> Arc<PerformanceMonitor> {
        Arc::clone(&self.monitor)
    }

    /// Decides one utterance for one session and records the interaction.
    pub async fn handle(&self, text: &str, session_id: &str) -> Decision {
        self.handle_graded(text, session_id, None).await
    }

    /// Same as `handle`, with a ground-truth label attached to the
    /// recording. Only the validation harness knows ground truth.
    pub async fn handle_graded(
        &self,
        text: &str,
        session_id: &str,
        ground_truth: Option<GroundTruth>,
    ) -> Decision {
        let utterance = Utterance::new(session_id, text);
        let started = Instant::now();
        let decision = self.decide(&utterance.text, &utterance.session_id).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        self.monitor.record_interaction(&decision, elapsed_ms, ground_truth);
        info!(
            event_name = "pipeline.decided",
            utterance_id = %utterance.id,
            session_id,
            action = decision.action().map(|a| a.wire_name()).unwrap_or("none"),
            confidence = decision.confidence(),
            elapsed_ms,
            "utterance decided"
        );
        decision
    }

    async fn decide(&self, text: &str, session_id: &str) -> Decision {
        let folded = fold_text(text);
        if folded.is_empty() {
            return Decision::Unrecognized { reason: UnrecognizedReason::EmptyUtterance };
        }

        if let Some(pending) = self.sessions.take_pending(session_id) {
            match interpret_reply(&folded) {
                Reply::Affirm => return self.confirm_pending(session_id, pending),
                Reply::Cancel => {
                    info!(
                        event_name = "pipeline.pending_cancelled",
                        session_id,
                        action = pending.action.wire_name(),
                        "pending action cancelled by user"
                    );
                    return Decision::Unrecognized { reason: UnrecognizedReason::CancelledByUser };
                }
                Reply::NewUtterance => {
                    // Last utterance wins: the pending slot is discarded,
                    // never queued behind.
                    debug!(
                        event_name = "pipeline.pending_replaced",
                        session_id,
                        discarded_action = pending.action.wire_name(),
                        "new utterance replaces pending confirmation"
                    );
                }
            }
        }

        let (retrieved, classified) =
            tokio::join!(self.run_retrieval(&folded), self.run_classifier(&folded));

        let retrieval_candidate = retrieved
            .filter(|found| found.similarity >= self.thresholds.retrieval_similarity)
            .map(|found| Candidate {
                action: found.action,
                confidence: found.similarity,
                source: StageSource::Retrieval,
            });
        let classifier_candidate =
            classified.filter(|candidate| {
                candidate.confidence >= self.thresholds.classifier_confidence
            });

        if let (Some(from_model), Some(from_corpus)) =
            (&classifier_candidate, &retrieval_candidate)
        {
            if from_model.action != from_corpus.action {
                // Both stages cleared their floors but disagree; the
                // classifier wins deterministically.
                debug!(
                    event_name = "pipeline.ambiguous_candidate",
                    classifier_action = from_model.action.wire_name(),
                    retrieval_action = from_corpus.action.wire_name(),
                    "stage disagreement resolved to classifier"
                );
            }
        }

        let selected = match classifier_candidate.or(retrieval_candidate) {
            Some(candidate) => candidate,
            None => {
                let fallback = self
                    .fallback
                    .detect(&folded)
                    .filter(|candidate| {
                        candidate.confidence >= self.thresholds.fallback_confidence
                    });
                match fallback {
                    Some(candidate) => candidate,
                    None => {
                        return Decision::Unrecognized {
                            reason: UnrecognizedReason::NoUsableCandidate,
                        }
                    }
                }
            }
        };

        self.resolve_parameters(text, session_id, selected).await
    }

    fn confirm_pending(&self, session_id: &str, pending: PendingAction) -> Decision {
        if pending.missing.is_empty() {
            info!(
                event_name = "pipeline.pending_confirmed",
                session_id,
                action = pending.action.wire_name(),
                "pending action confirmed"
            );
            return Decision::Executed {
                action: pending.action,
                parameters: pending.parameters,
                confidence: pending.confidence,
                source: pending.source,
            };
        }

        // Confirmed, but required fields are still unresolved; the action
        // must not execute with partial parameters.
        let decision = Decision::PendingConfirmation {
            action: pending.action,
            parameters: pending.parameters.clone(),
            missing: pending.missing.clone(),
            confidence: pending.confidence,
            source: pending.source,
        };
        self.sessions.set_pending(session_id, pending);
        decision
    }

    async fn run_retrieval(&self, folded: &str) -> Option<RetrievalMatch> {
        match self.stage_policy.call(|| self.retrieval.retrieve(folded)).await {
            Ok(found) => found,
            Err(error) => {
                warn!(
                    event_name = "pipeline.stage_degraded",
                    stage = "retrieval",
                    error = %error,
                    "retrieval degraded to no candidate"
                );
                self.monitor.record_degraded_stage("retrieval", folded, &error.to_string());
                None
            }
        }
    }

    async fn run_classifier(&self, folded: &str) -> Option<Candidate> {
        match self.classifier.classify(folded, None).await {
            Ok(candidate) => candidate,
            Err(error) => {
                warn!(
                    event_name = "pipeline.stage_degraded",
                    stage = "classifier",
                    error = %error,
                    "classification degraded to no candidate"
                );
                self.monitor.record_degraded_stage("classifier", folded, &error.to_string());
                None
            }
        }
    }

    async fn resolve_parameters(
        &self,
        text: &str,
        session_id: &str,
        selected: Candidate,
    ) -> Decision {
        let schema = selected.action.schema();
        let mut parameters = ParameterSet::new();
        let mut missing = schema.missing_required(&parameters);

        if !missing.is_empty() {
            match self.extractor.extract(text, selected.action).await {
                Ok(extraction) => {
                    if !extraction.dropped.is_empty() {
                        debug!(
                            event_name = "pipeline.fields_dropped",
                            action = selected.action.wire_name(),
                            dropped = ?extraction.dropped,
                            "unparsable or out-of-schema fields stay missing"
                        );
                    }
                    parameters = extraction.parameters;
                    missing = schema.missing_required(&parameters);
                }
                Err(error) => {
                    warn!(
                        event_name = "pipeline.stage_degraded",
                        stage = "extraction",
                        error = %error,
                        "extraction degraded, required fields stay missing"
                    );
                    self.monitor.record_degraded_stage("extraction", text, &error.to_string());
                }
            }
        }

        let critical_amount = selected.action.records_data()
            && parameters
                .get("montant")
                .and_then(|value| value.as_number())
                .map(|montant| montant > self.critical_amount_fcfa as f64)
                .unwrap_or(false);

        if missing.is_empty() && !critical_amount {
            return Decision::Executed {
                action: selected.action,
                parameters,
                confidence: selected.confidence,
                source: selected.source,
            };
        }

        if critical_amount {
            info!(
                event_name = "pipeline.critical_amount",
                action = selected.action.wire_name(),
                "amount above the critical threshold requires confirmation"
            );
        }

        let pending = PendingAction {
            action: selected.action,
            parameters: parameters.clone(),
            missing: missing.clone(),
            confidence: selected.confidence,
            source: selected.source,
            issued_at: Utc::now(),
        };
        self.sessions.set_pending(session_id, pending);

        Decision::PendingConfirmation {
            action: selected.action,
            parameters,
            missing,
            confidence: selected.confidence,
            source: selected.source,
        }
    }

    #[cfg(test)]
    fn pending_count(&self) -> usize {
        self.sessions.pending_count()
    }
}
