//! Process-wide performance monitor.
//!
//! One instance per deployment, injected into the orchestrator; there is no
//! ambient global. Every completed decision is recorded here. Updates are
//! serialized behind a single mutex so concurrent sessions never lose
//! counts; reads return a consistent snapshot that may trail in-flight
//! recordings.
//!
//! With ground truth attached (validation runs), recordings also feed the
//! confusion counters behind precision/recall/F1. Ground truth never exists
//! at runtime, so live traffic only accumulates throughput aggregates.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use porcher_core::{ActionKind, Decision, StageSource};

/// Recent degraded-stage events kept for the report renderer.
const ERROR_RING_CAPACITY: usize = 50;

/// Utterances are excerpted in error entries; full text stays out of the
/// monitor.
const EXCERPT_LEN: usize = 50;

/// Externally known correct label for one utterance, available only during
/// offline validation. `Noise` marks an utterance that maps to no action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroundTruth {
    Action(ActionKind),
    Noise,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StageWins {
    pub classifier: u64,
    pub retrieval: u64,
    pub fallback: u64,
}

/// Throughput/latency/confidence aggregates for the report renderer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Metrics {
    pub total_messages: u64,
    pub successful_detections: u64,
    pub failed_detections: u64,
    pub average_confidence: f64,
    pub average_response_time_ms: f64,
    pub extraction_success_rate: f64,
    pub action_success_rate: f64,
    pub stage_wins: StageWins,
    pub last_updated: DateTime<Utc>,
}

/// Classification-quality metrics from the confusion counters. Only
/// available once at least one graded interaction was recorded.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PrecisionMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub true_positives: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
}

/// One degraded capability call, for the error ring.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DegradedStage {
    pub stage: String,
    pub utterance_excerpt: String,
    pub error: String,
    pub at: DateTime<Utc>,
}

#[derive(Default)]
struct MonitorState {
    total_messages: u64,
    successful_detections: u64,
    failed_detections: u64,
    confidence_sum: f64,
    response_time_sum_ms: u64,
    extraction_successes: u64,
    action_successes: u64,
    stage_wins: StageWins,
    errors: VecDeque<DegradedStage>,
    graded: u64,
    true_positives: u64,
    false_positives: u64,
    false_negatives: u64,
    true_negatives: u64,
    last_updated: Option<DateTime<Utc>>,
}

/// Process-wide interaction recorder. Cheap to share behind an `Arc`.
#[derive(Default)]
pub struct PerformanceMonitor {
    state: Mutex<MonitorState>,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one completed decision. `ground_truth` is only ever passed
    /// by the validation harness.
    pub fn record_interaction(
        &self,
        decision: &Decision,
        elapsed_ms: u64,
        ground_truth: Option<GroundTruth>,
    ) {
        let mut state = self.lock();
        state.total_messages += 1;
        state.response_time_sum_ms += elapsed_ms;
        state.confidence_sum += decision.confidence();

        if decision.is_actionable() {
            state.successful_detections += 1;
        } else {
            state.failed_detections += 1;
        }

        if decision.parameters().map(|params| !params.is_empty()).unwrap_or(false) {
            state.extraction_successes += 1;
        }
        if matches!(decision, Decision::Executed { .. }) {
            state.action_successes += 1;
        }

        match decision {
            Decision::Executed { source, .. } | Decision::PendingConfirmation { source, .. } => {
                match source {
                    StageSource::Classifier => state.stage_wins.classifier += 1,
                    StageSource::Retrieval => state.stage_wins.retrieval += 1,
                    StageSource::Fallback => state.stage_wins.fallback += 1,
                }
            }
            Decision::Unrecognized { .. } => {}
        }

        if let Some(truth) = ground_truth {
            state.graded += 1;
            match (decision.action(), truth) {
                (Some(predicted), GroundTruth::Action(expected)) if predicted == expected => {
                    state.true_positives += 1;
                }
                (Some(_), GroundTruth::Action(_)) | (Some(_), GroundTruth::Noise) => {
                    state.false_positives += 1;
                }
                (None, GroundTruth::Action(_)) => state.false_negatives += 1,
                (None, GroundTruth::Noise) => state.true_negatives += 1,
            }
        }

        state.last_updated = Some(Utc::now());
    }

    /// Records a capability call that degraded to "no candidate".
    pub fn record_degraded_stage(&self, stage: &str, utterance: &str, error: &str) {
        let mut state = self.lock();
        if state.errors.len() == ERROR_RING_CAPACITY {
            state.errors.pop_front();
        }
        state.errors.push_back(DegradedStage {
            stage: stage.to_string(),
            utterance_excerpt: excerpt(utterance),
            error: error.to_string(),
            at: Utc::now(),
        });
        state.last_updated = Some(Utc::now());
    }

    /// Snapshot of the running aggregates. Averages over zero interactions
    /// are zero, never NaN.
    pub fn metrics(&self) -> Metrics {
        let state = self.lock();
        let total = state.total_messages;

        Metrics {
            total_messages: total,
            successful_detections: state.successful_detections,
            failed_detections: state.failed_detections,
            average_confidence: ratio(state.confidence_sum, total),
            average_response_time_ms: ratio(state.response_time_sum_ms as f64, total),
            extraction_success_rate: ratio(state.extraction_successes as f64, total),
            action_success_rate: ratio(state.action_successes as f64, total),
            stage_wins: state.stage_wins,
            last_updated: state.last_updated.unwrap_or_else(Utc::now),
        }
    }

    /// Precision/recall/F1 from the confusion counters, or `None` before
    /// the first graded interaction. Zero denominators yield zero.
    pub fn precision_metrics(&self) -> Option<PrecisionMetrics> {
        let state = self.lock();
        if state.graded == 0 {
            return None;
        }

        let tp = state.true_positives as f64;
        let fp = state.false_positives as f64;
        let fn_ = state.false_negatives as f64;

        let precision = if tp + fp > 0.0 { tp / (tp + fp) } else { 0.0 };
        let recall = if tp + fn_ > 0.0 { tp / (tp + fn_) } else { 0.0 };
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Some(PrecisionMetrics {
            precision,
            recall,
            f1_score,
            true_positives: state.true_positives,
            false_positives: state.false_positives,
            false_negatives: state.false_negatives,
        })
    }

    pub fn recent_errors(&self) -> Vec<DegradedStage> {
        self.lock().errors.iter().cloned().collect()
    }

    pub fn reset(&self) {
        *self.lock() = MonitorState::default();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn ratio(sum: f64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn excerpt(utterance: &str) -> String {
    utterance.chars().take(EXCERPT_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::{GroundTruth, PerformanceMonitor};
    use porcher_core::{ActionKind, Decision, ParamValue, ParameterSet, StageSource, UnrecognizedReason};

    fn executed(action: ActionKind, confidence: f64) -> Decision {
        let mut parameters = ParameterSet::new();
        parameters.insert("montant".to_string(), ParamValue::integer(800_000));
        Decision::Executed { action, parameters, confidence, source: StageSource::Retrieval }
    }

    fn unrecognized() -> Decision {
        Decision::Unrecognized { reason: UnrecognizedReason::NoUsableCandidate }
    }

    #[test]
    fn no_precision_metrics_before_the_first_graded_interaction() {
        let monitor = PerformanceMonitor::new();
        assert!(monitor.precision_metrics().is_none());

        // Ungraded traffic still leaves the sentinel in place.
        monitor.record_interaction(&executed(ActionKind::CreateRevenu, 0.9), 12, None);
        assert!(monitor.precision_metrics().is_none());
    }

    #[test]
    fn aggregates_average_over_all_messages() {
        let monitor = PerformanceMonitor::new();
        monitor.record_interaction(&executed(ActionKind::CreateRevenu, 0.9), 10, None);
        monitor.record_interaction(&unrecognized(), 30, None);

        let metrics = monitor.metrics();
        assert_eq!(metrics.total_messages, 2);
        assert_eq!(metrics.successful_detections, 1);
        assert_eq!(metrics.failed_detections, 1);
        assert!((metrics.average_confidence - 0.45).abs() < 1e-9);
        assert!((metrics.average_response_time_ms - 20.0).abs() < 1e-9);
        assert_eq!(metrics.extraction_success_rate, 0.5);
        assert_eq!(metrics.action_success_rate, 0.5);
        assert_eq!(metrics.stage_wins.retrieval, 1);
    }

    #[test]
    fn confusion_counters_follow_the_grading_rules() {
        let monitor = PerformanceMonitor::new();

        // Correct prediction.
        monitor.record_interaction(
            &executed(ActionKind::CreateRevenu, 0.95),
            5,
            Some(GroundTruth::Action(ActionKind::CreateRevenu)),
        );
        // Wrong action predicted.
        monitor.record_interaction(
            &executed(ActionKind::CreateDepense, 0.9),
            5,
            Some(GroundTruth::Action(ActionKind::CreateRevenu)),
        );
        // Predicted something for small talk.
        monitor.record_interaction(
            &executed(ActionKind::GetStatistics, 0.85),
            5,
            Some(GroundTruth::Noise),
        );
        // Missed a real action.
        monitor.record_interaction(
            &unrecognized(),
            5,
            Some(GroundTruth::Action(ActionKind::CreatePesee)),
        );
        // Correctly ignored small talk.
        monitor.record_interaction(&unrecognized(), 5, Some(GroundTruth::Noise));

        let precision = monitor.precision_metrics().expect("graded interactions present");
        assert_eq!(precision.true_positives, 1);
        assert_eq!(precision.false_positives, 2);
        assert_eq!(precision.false_negatives, 1);
        assert!((precision.precision - 1.0 / 3.0).abs() < 1e-9);
        assert!((precision.recall - 0.5).abs() < 1e-9);

        let expected_f1 = 2.0 * (1.0 / 3.0) * 0.5 / (1.0 / 3.0 + 0.5);
        assert!((precision.f1_score - expected_f1).abs() < 1e-9);
    }

    #[test]
    fn zero_denominators_yield_zero_not_nan() {
        let monitor = PerformanceMonitor::new();
        monitor.record_interaction(&unrecognized(), 5, Some(GroundTruth::Noise));

        let precision = monitor.precision_metrics().expect("one graded interaction");
        assert_eq!(precision.precision, 0.0);
        assert_eq!(precision.recall, 0.0);
        assert_eq!(precision.f1_score, 0.0);
    }

    #[test]
    fn error_ring_is_bounded() {
        let monitor = PerformanceMonitor::new();
        for index in 0..60 {
            monitor.record_degraded_stage("classifier", &format!("utterance {index}"), "timeout");
        }

        let errors = monitor.recent_errors();
        assert_eq!(errors.len(), 50);
        assert_eq!(errors[0].utterance_excerpt, "utterance 10");
    }

    #[test]
    fn reset_clears_everything_including_the_sentinel() {
        let monitor = PerformanceMonitor::new();
        monitor.record_interaction(
            &executed(ActionKind::CreateRevenu, 0.9),
            5,
            Some(GroundTruth::Action(ActionKind::CreateRevenu)),
        );
        monitor.reset();

        assert_eq!(monitor.metrics().total_messages, 0);
        assert!(monitor.precision_metrics().is_none());
        assert!(monitor.recent_errors().is_empty());
    }
}
