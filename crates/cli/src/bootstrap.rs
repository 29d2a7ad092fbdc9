//! Process assembly.
//!
//! Every service is an explicit object wired here once and passed down by
//! injection; there is no ambient global state. The default wiring is the
//! fully offline stack: hashed-token embeddings over the built-in corpus,
//! an abstaining classifier and the rule-based extractor.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use porcher_agent::capabilities::NoopClassifier;
use porcher_agent::corpus::builtin_corpus;
use porcher_agent::extractor::RuleBasedExtractor;
use porcher_agent::monitor::PerformanceMonitor;
use porcher_agent::retrieval::{HashingEmbedder, RetrievalMatcher};
use porcher_agent::Orchestrator;
use porcher_core::config::AppConfig;

pub fn init_logging(config: &AppConfig) {
    use porcher_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

pub async fn build_orchestrator(config: &AppConfig) -> Result<Orchestrator> {
    let retrieval = RetrievalMatcher::build(Arc::new(HashingEmbedder), builtin_corpus())
        .await
        .context("indexing the intent corpus")?;

    info!(
        event_name = "system.bootstrap.corpus_indexed",
        entries = retrieval.len(),
        "intent corpus embedded and indexed"
    );

    Ok(Orchestrator::new(
        config,
        retrieval,
        Arc::new(NoopClassifier),
        Arc::new(RuleBasedExtractor),
        Arc::new(PerformanceMonitor::new()),
    ))
}
