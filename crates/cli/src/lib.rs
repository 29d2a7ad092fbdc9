//! Porcher operator CLI.
//!
//! `ask` feeds one utterance through the pipeline and prints the decision;
//! `validate` runs the scenario batteries and renders the validation
//! report together with the monitor's aggregates. This binary is the
//! report-rendering collaborator of the core: it consumes
//! `ValidationReport` and the monitor metrics verbatim and owns only their
//! presentation.

pub mod bootstrap;
pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use porcher_core::config::{AppConfig, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "porcher",
    about = "Assistant conversationnel d'élevage - CLI opérateur",
    after_help = "Examples:\n  porcher ask \"j'ai vendu 5 porcs à 800000\"\n  porcher validate --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Chemin vers porcher.toml")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Décide un énoncé et affiche la décision")]
    Ask {
        utterance: String,
        #[arg(long, default_value = "cli", help = "Identifiant de session")]
        session: String,
        #[arg(long, help = "Sortie JSON machine")]
        json: bool,
    },
    #[command(about = "Exécute les batteries de validation et affiche le rapport")]
    Validate {
        #[arg(long, help = "Sortie JSON machine")]
        json: bool,
    },
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load(LoadOptions {
        config_path: cli.config.clone(),
        ..LoadOptions::default()
    }) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("configuration invalide: {error}");
            return ExitCode::from(2);
        }
    };
    bootstrap::init_logging(&config);

    let result = match cli.command {
        Command::Ask { utterance, session, json } => {
            commands::ask::run(&config, &utterance, &session, json).await
        }
        Command::Validate { json } => commands::validate::run(&config, json).await,
    };

    match result {
        Ok(command_result) => {
            println!("{}", command_result.output);
            ExitCode::from(command_result.exit_code)
        }
        Err(error) => {
            eprintln!("{error:#}");
            ExitCode::FAILURE
        }
    }
}
