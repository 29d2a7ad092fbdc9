use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use porcher_agent::monitor::{Metrics, PrecisionMetrics};
use porcher_core::config::AppConfig;
use porcher_harness::report::ValidationReport;
use porcher_harness::ValidationHarness;

use crate::bootstrap;
use crate::commands::CommandResult;

pub async fn run(config: &AppConfig, json: bool) -> Result<CommandResult> {
    let orchestrator = Arc::new(bootstrap::build_orchestrator(config).await?);
    let harness = ValidationHarness::new(Arc::clone(&orchestrator));

    let report = harness.run_all_tests().await;
    let metrics = orchestrator.monitor().metrics();
    let precision = orchestrator.monitor().precision_metrics();

    let output = if json {
        serde_json::to_string_pretty(&json!({
            "report": report,
            "metrics": metrics,
            "precision": precision,
        }))?
    } else {
        render_report(&report, &metrics, precision.as_ref())
    };

    let exit_code = if report.failed_tests == 0 { 0 } else { 1 };
    Ok(CommandResult { exit_code, output })
}

fn render_report(
    report: &ValidationReport,
    metrics: &Metrics,
    precision: Option<&PrecisionMetrics>,
) -> String {
    let separator = "=".repeat(78);
    let mut lines = Vec::new();

    lines.push(separator.clone());
    lines.push("RAPPORT DE VALIDATION DE L'AGENT CONVERSATIONNEL".to_string());
    lines.push(separator.clone());
    lines.push(format!("Date : {}", report.timestamp.format("%d/%m/%Y %H:%M:%S UTC")));
    lines.push(String::new());
    lines.push(format!("Tests réussis : {}/{}", report.passed_tests, report.total_tests));
    lines.push(format!("Tests échoués : {}/{}", report.failed_tests, report.total_tests));
    lines.push(format!("Taux de succès : {:.2}%", report.success_rate));
    lines.push(format!("Confiance moyenne : {:.2}%", report.average_confidence * 100.0));
    lines.push(format!("Temps d'exécution moyen : {:.0} ms", report.average_execution_time_ms));
    lines.push(String::new());
    lines.push(format!("STATUT : {}", report.band().label()));

    let failures: Vec<&_> = report.results.iter().filter(|result| !result.passed).collect();
    if !failures.is_empty() {
        lines.push(String::new());
        lines.push("ÉCHECS :".to_string());
        for result in failures {
            lines.push(format!(
                "  [{}] {} -> {}",
                result.battery.label(),
                result.test_name,
                result.error.as_deref().unwrap_or("sans détail")
            ));
        }
    }

    lines.push(String::new());
    lines.push("MONITEUR :".to_string());
    lines.push(format!("  Messages traités : {}", metrics.total_messages));
    lines.push(format!(
        "  Détections réussies / échouées : {} / {}",
        metrics.successful_detections, metrics.failed_detections
    ));
    lines.push(format!("  Taux d'extraction : {:.2}%", metrics.extraction_success_rate * 100.0));
    lines.push(format!("  Taux d'exécution : {:.2}%", metrics.action_success_rate * 100.0));
    lines.push(format!(
        "  Étage gagnant (classifieur / corpus / secours) : {} / {} / {}",
        metrics.stage_wins.classifier, metrics.stage_wins.retrieval, metrics.stage_wins.fallback
    ));
    if let Some(precision) = precision {
        lines.push(format!(
            "  Précision {:.2} | Rappel {:.2} | F1 {:.2} (VP {} / FP {} / FN {})",
            precision.precision,
            precision.recall,
            precision.f1_score,
            precision.true_positives,
            precision.false_positives,
            precision.false_negatives
        ));
    }
    lines.push(separator);

    lines.join("\n")
}
