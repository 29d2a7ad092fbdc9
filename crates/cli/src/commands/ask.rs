use anyhow::Result;

use porcher_core::config::AppConfig;
use porcher_core::Decision;

use crate::bootstrap;
use crate::commands::CommandResult;

pub async fn run(
    config: &AppConfig,
    utterance: &str,
    session: &str,
    json: bool,
) -> Result<CommandResult> {
    let orchestrator = bootstrap::build_orchestrator(config).await?;
    let decision = orchestrator.handle(utterance, session).await;

    let output = if json {
        serde_json::to_string_pretty(&decision)?
    } else {
        render_decision(&decision)
    };

    Ok(CommandResult { exit_code: 0, output })
}

fn render_decision(decision: &Decision) -> String {
    let mut lines = Vec::new();
    match decision {
        Decision::Executed { action, parameters, confidence, .. } => {
            lines.push(format!(
                "Action exécutée : {action} (confiance {:.0}%)",
                confidence * 100.0
            ));
            for (name, value) in parameters {
                lines.push(format!("  - {name} : {value}"));
            }
        }
        Decision::PendingConfirmation { action, parameters, missing, confidence, .. } => {
            lines.push(format!(
                "Confirmation requise : {action} (confiance {:.0}%)",
                confidence * 100.0
            ));
            for (name, value) in parameters {
                lines.push(format!("  - {name} : {value}"));
            }
            if !missing.is_empty() {
                lines.push(format!("Champs manquants : {}", missing.join(", ")));
            }
            lines.push("Répondez « oui » pour confirmer ou « non » pour annuler.".to_string());
        }
        Decision::Unrecognized { reason } => {
            lines.push(reason.user_message().to_string());
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::render_decision;
    use porcher_core::{
        ActionKind, Decision, ParamValue, ParameterSet, StageSource, UnrecognizedReason,
    };

    #[test]
    fn pending_render_lists_exactly_the_missing_fields() {
        let decision = Decision::PendingConfirmation {
            action: ActionKind::CreatePesee,
            parameters: ParameterSet::new(),
            missing: vec!["animal_code".to_string(), "poids_kg".to_string()],
            confidence: 0.8,
            source: StageSource::Fallback,
        };

        let rendered = render_decision(&decision);
        assert!(rendered.contains("Champs manquants : animal_code, poids_kg"));
        assert!(rendered.contains("oui"));
    }

    #[test]
    fn executed_render_shows_canonical_parameters() {
        let mut parameters = ParameterSet::new();
        parameters.insert("montant".to_string(), ParamValue::integer(800_000));
        parameters.insert("nombre".to_string(), ParamValue::integer(5));

        let decision = Decision::Executed {
            action: ActionKind::CreateRevenu,
            parameters,
            confidence: 0.95,
            source: StageSource::Retrieval,
        };

        let rendered = render_decision(&decision);
        assert!(rendered.contains("create_revenu"));
        assert!(rendered.contains("montant : 800000"));
    }

    #[test]
    fn unrecognized_render_is_a_generic_fallback() {
        let decision = Decision::Unrecognized { reason: UnrecognizedReason::NoUsableCandidate };
        assert!(render_decision(&decision).contains("Je n'ai pas compris"));
    }
}
