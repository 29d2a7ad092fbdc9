use porcher_cli::commands::{ask, validate};
use porcher_core::config::AppConfig;
use serde_json::Value;

#[tokio::test]
async fn ask_renders_an_executed_sale() {
    let config = AppConfig::default();
    let result = ask::run(&config, "j ai vendu 5 porcs a 800000", "it-session", false)
        .await
        .expect("ask command runs");

    assert_eq!(result.exit_code, 0);
    assert!(result.output.contains("create_revenu"), "output was: {}", result.output);
    assert!(result.output.contains("montant : 800000"), "output was: {}", result.output);
    assert!(result.output.contains("nombre : 5"), "output was: {}", result.output);
}

#[tokio::test]
async fn ask_json_payload_is_machine_readable() {
    let config = AppConfig::default();
    let result = ask::run(&config, "peser p001 il fait 45 kg", "it-session", true)
        .await
        .expect("ask command runs");

    let payload: Value = serde_json::from_str(&result.output).expect("json output parses");
    assert_eq!(payload["kind"], "executed");
    assert_eq!(payload["action"], "create_pesee");
    assert_eq!(payload["parameters"]["animal_code"], "P001");
    assert_eq!(payload["parameters"]["poids_kg"].as_f64(), Some(45.0));
}

#[tokio::test]
async fn ask_reports_unrecognized_politely() {
    let config = AppConfig::default();
    let result =
        ask::run(&config, "bonjour", "it-session", false).await.expect("ask command runs");

    assert_eq!(result.exit_code, 0);
    assert!(result.output.contains("Je n'ai pas compris"), "output was: {}", result.output);
}

#[tokio::test]
async fn validate_passes_offline_and_exits_zero() {
    let config = AppConfig::default();
    let result = validate::run(&config, true).await.expect("validate command runs");

    let payload: Value = serde_json::from_str(&result.output).expect("json output parses");
    assert_eq!(result.exit_code, 0, "failed scenarios: {}", payload["report"]["results"]);
    assert_eq!(payload["report"]["failed_tests"], 0);
    assert!(payload["report"]["success_rate"].as_f64() >= Some(95.0));
    assert!(payload["precision"]["precision"].as_f64() >= Some(0.9));
    assert_eq!(
        payload["metrics"]["total_messages"].as_u64(),
        payload["report"]["total_tests"].as_u64()
    );
}
