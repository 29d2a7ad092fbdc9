//! Validation run reporting types.
//!
//! A `ValidationReport` is an immutable, timestamped snapshot consumed
//! verbatim by an external report renderer. The quality bands are a
//! presentation concern; they never influence pipeline behavior.

use chrono::{DateTime, Utc};
use serde::Serialize;

use porcher_core::ParameterSet;

/// Which scenario battery a result belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Battery {
    Detection,
    Extraction,
    Robustness,
    EdgeCases,
}

impl Battery {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Detection => "detection",
            Self::Extraction => "extraction",
            Self::Robustness => "robustesse",
            Self::EdgeCases => "cas limites",
        }
    }
}

/// Outcome of one scenario. Never persisted beyond the run.
#[derive(Clone, Debug, Serialize)]
pub struct TestResult {
    pub test_name: String,
    pub battery: Battery,
    pub passed: bool,
    pub confidence: f64,
    pub extracted_parameters: Option<ParameterSet>,
    pub error: Option<String>,
    pub execution_time_ms: u64,
}

/// Aggregate of one harness run.
#[derive(Clone, Debug, Serialize)]
pub struct ValidationReport {
    pub total_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: usize,
    pub success_rate: f64,
    pub average_confidence: f64,
    pub average_execution_time_ms: f64,
    pub results: Vec<TestResult>,
    pub timestamp: DateTime<Utc>,
}

impl ValidationReport {
    pub fn from_results(results: Vec<TestResult>) -> Self {
        let total_tests = results.len();
        let passed_tests = results.iter().filter(|result| result.passed).count();
        let failed_tests = total_tests - passed_tests;

        let success_rate = if total_tests > 0 {
            passed_tests as f64 / total_tests as f64 * 100.0
        } else {
            0.0
        };

        let confident: Vec<f64> = results
            .iter()
            .filter(|result| result.confidence > 0.0)
            .map(|result| result.confidence)
            .collect();
        let average_confidence = if confident.is_empty() {
            0.0
        } else {
            confident.iter().sum::<f64>() / confident.len() as f64
        };

        let average_execution_time_ms = if total_tests > 0 {
            results.iter().map(|result| result.execution_time_ms).sum::<u64>() as f64
                / total_tests as f64
        } else {
            0.0
        };

        Self {
            total_tests,
            passed_tests,
            failed_tests,
            success_rate,
            average_confidence,
            average_execution_time_ms,
            results,
            timestamp: Utc::now(),
        }
    }

    pub fn band(&self) -> ReportBand {
        ReportBand::for_success_rate(self.success_rate)
    }
}

/// Presentation band for a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportBand {
    Excellent,
    Good,
    NeedsImprovement,
}

impl ReportBand {
    pub fn for_success_rate(success_rate: f64) -> Self {
        if success_rate >= 95.0 {
            Self::Excellent
        } else if success_rate >= 85.0 {
            Self::Good
        } else {
            Self::NeedsImprovement
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "EXCELLENT - agent opérationnel et performant",
            Self::Good => "BON - quelques améliorations possibles",
            Self::NeedsImprovement => "À AMÉLIORER - des corrections sont nécessaires",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Battery, ReportBand, TestResult, ValidationReport};

    fn result(passed: bool, confidence: f64, execution_time_ms: u64) -> TestResult {
        TestResult {
            test_name: "case".to_string(),
            battery: Battery::Detection,
            passed,
            confidence,
            extracted_parameters: None,
            error: None,
            execution_time_ms,
        }
    }

    #[test]
    fn success_rate_is_exactly_passed_over_total_times_hundred() {
        let report = ValidationReport::from_results(vec![
            result(true, 0.9, 10),
            result(true, 0.95, 20),
            result(false, 0.0, 30),
            result(true, 0.85, 40),
        ]);

        assert_eq!(report.total_tests, 4);
        assert_eq!(report.passed_tests, 3);
        assert_eq!(report.failed_tests, 1);
        assert_eq!(report.success_rate, 3.0 / 4.0 * 100.0);
    }

    #[test]
    fn average_confidence_ignores_zero_confidence_results() {
        let report =
            ValidationReport::from_results(vec![result(true, 0.9, 10), result(false, 0.0, 10)]);
        assert!((report.average_confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn empty_run_reports_zeroes_not_nan() {
        let report = ValidationReport::from_results(Vec::new());
        assert_eq!(report.success_rate, 0.0);
        assert_eq!(report.average_confidence, 0.0);
        assert_eq!(report.average_execution_time_ms, 0.0);
    }

    #[test]
    fn bands_follow_the_documented_cutoffs() {
        assert_eq!(ReportBand::for_success_rate(100.0), ReportBand::Excellent);
        assert_eq!(ReportBand::for_success_rate(95.0), ReportBand::Excellent);
        assert_eq!(ReportBand::for_success_rate(94.9), ReportBand::Good);
        assert_eq!(ReportBand::for_success_rate(85.0), ReportBand::Good);
        assert_eq!(ReportBand::for_success_rate(84.9), ReportBand::NeedsImprovement);
    }
}
