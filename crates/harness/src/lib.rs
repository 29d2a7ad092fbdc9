//! Validation harness - scenario batteries against a live orchestrator.
//!
//! Runs the four canonical batteries (`scenarios`) through
//! `Orchestrator::handle_graded`, so every scenario also feeds the
//! monitor's confusion counters with ground truth. Produces a
//! `ValidationReport` (`report`) for an external renderer; nothing here is
//! persisted beyond the run.

pub mod report;
pub mod scenarios;

use std::sync::Arc;
use std::time::Instant;

use tracing::info;
use uuid::Uuid;

use porcher_agent::monitor::GroundTruth;
use porcher_agent::Orchestrator;
use porcher_core::Decision;

use crate::report::{Battery, TestResult, ValidationReport};
use crate::scenarios::{Expectation, TestCase};

pub use crate::report::ReportBand;

pub struct ValidationHarness {
    orchestrator: Arc<Orchestrator>,
}

impl ValidationHarness {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Runs every battery and aggregates the outcome.
    pub async fn run_all_tests(&self) -> ValidationReport {
        let batteries = [
            (Battery::Detection, scenarios::detection_battery()),
            (Battery::Extraction, scenarios::extraction_battery()),
            (Battery::Robustness, scenarios::robustness_battery()),
            (Battery::EdgeCases, scenarios::edge_case_battery()),
        ];

        let mut results = Vec::new();
        for (battery, cases) in batteries {
            for case in cases {
                results.push(self.run_case(battery, case).await);
            }
        }

        let validation_report = ValidationReport::from_results(results);
        info!(
            event_name = "harness.run_completed",
            total = validation_report.total_tests,
            passed = validation_report.passed_tests,
            success_rate = validation_report.success_rate,
            "validation run completed"
        );
        validation_report
    }

    async fn run_case(&self, battery: Battery, case: TestCase) -> TestResult {
        // Fresh session per scenario: no pending-confirmation bleed.
        let session_id = format!("validation-{}", Uuid::new_v4());
        let ground_truth = match &case.expectation {
            Expectation::Action { action, .. } | Expectation::Parameters { action, .. } => {
                GroundTruth::Action(*action)
            }
            Expectation::Noise => GroundTruth::Noise,
        };

        let started = Instant::now();
        let decision =
            self.orchestrator.handle_graded(case.utterance, &session_id, Some(ground_truth)).await;
        let execution_time_ms = started.elapsed().as_millis() as u64;

        let (passed, error) = evaluate(&case, &decision);
        TestResult {
            test_name: format!("{}: \"{}\"", case.name, case.utterance),
            battery,
            passed,
            confidence: if passed { decision.confidence() } else { 0.0 },
            extracted_parameters: decision.parameters().cloned(),
            error,
            execution_time_ms,
        }
    }
}

fn evaluate(case: &TestCase, decision: &Decision) -> (bool, Option<String>) {
    match &case.expectation {
        Expectation::Action { action, min_confidence } => {
            if decision.action() != Some(*action) {
                return (
                    false,
                    Some(format!(
                        "attendu {}, obtenu {}",
                        action,
                        decision.action().map(|a| a.wire_name()).unwrap_or("aucun")
                    )),
                );
            }
            if decision.confidence() < *min_confidence {
                return (
                    false,
                    Some(format!(
                        "confiance {:.2} sous le minimum {:.2}",
                        decision.confidence(),
                        min_confidence
                    )),
                );
            }
            (true, None)
        }
        Expectation::Parameters { action, params } => {
            if decision.action() != Some(*action) {
                return (
                    false,
                    Some(format!(
                        "attendu {}, obtenu {}",
                        action,
                        decision.action().map(|a| a.wire_name()).unwrap_or("aucun")
                    )),
                );
            }

            let extracted = decision.parameters();
            let mut failures = Vec::new();
            for expectation in params {
                let actual = extracted.and_then(|set| set.get(expectation.name));
                if !expectation.matches(actual) {
                    failures.push(format!(
                        "{}: attendu {}, obtenu {}",
                        expectation.name,
                        expectation.expected,
                        actual.map(|value| value.to_string()).unwrap_or_else(|| "rien".to_string())
                    ));
                }
            }

            if failures.is_empty() {
                (true, None)
            } else {
                (false, Some(failures.join("; ")))
            }
        }
        Expectation::Noise => {
            if decision.is_actionable() {
                (
                    false,
                    Some(format!(
                        "attendu aucune action, obtenu {}",
                        decision.action().map(|a| a.wire_name()).unwrap_or("aucun")
                    )),
                )
            } else {
                (true, None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use porcher_agent::capabilities::NoopClassifier;
    use porcher_agent::corpus::builtin_corpus;
    use porcher_agent::extractor::RuleBasedExtractor;
    use porcher_agent::monitor::PerformanceMonitor;
    use porcher_agent::retrieval::{HashingEmbedder, RetrievalMatcher};
    use porcher_agent::Orchestrator;
    use porcher_core::config::AppConfig;

    use super::{ReportBand, ValidationHarness};

    async fn offline_orchestrator() -> Orchestrator {
        let retrieval = RetrievalMatcher::build(Arc::new(HashingEmbedder), builtin_corpus())
            .await
            .expect("matcher builds");
        Orchestrator::new(
            &AppConfig::default(),
            retrieval,
            Arc::new(NoopClassifier),
            Arc::new(RuleBasedExtractor),
            Arc::new(PerformanceMonitor::new()),
        )
    }

    #[tokio::test]
    async fn full_run_passes_every_battery_offline() {
        let orchestrator = Arc::new(offline_orchestrator().await);
        let harness = ValidationHarness::new(Arc::clone(&orchestrator));

        let report = harness.run_all_tests().await;

        let failures: Vec<String> = report
            .results
            .iter()
            .filter(|result| !result.passed)
            .map(|result| {
                format!(
                    "{} [{}]",
                    result.test_name,
                    result.error.as_deref().unwrap_or("sans detail")
                )
            })
            .collect();
        assert!(failures.is_empty(), "failed scenarios: {failures:?}");

        assert_eq!(
            report.success_rate,
            report.passed_tests as f64 / report.total_tests as f64 * 100.0
        );
        assert_eq!(report.band(), ReportBand::Excellent);
        assert!(report.average_confidence >= 0.85);
    }

    #[tokio::test]
    async fn harness_feeds_the_confusion_counters() {
        let orchestrator = Arc::new(offline_orchestrator().await);
        let harness = ValidationHarness::new(Arc::clone(&orchestrator));

        assert!(orchestrator.monitor().precision_metrics().is_none());
        let report = harness.run_all_tests().await;

        let precision =
            orchestrator.monitor().precision_metrics().expect("graded interactions recorded");
        assert!(precision.true_positives as usize <= report.total_tests);
        assert!(precision.precision > 0.9);
        assert!(precision.recall > 0.9);
        assert!(precision.f1_score > 0.9);

        let metrics = orchestrator.monitor().metrics();
        assert_eq!(metrics.total_messages as usize, report.total_tests);
    }
}
