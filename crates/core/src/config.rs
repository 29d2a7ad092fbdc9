//! Configuration loading: defaults, optional `porcher.toml`, `PORCHER_*`
//! environment overrides, then programmatic overrides, validated last.
//!
//! Every confidence threshold the pipeline uses lives here so the stage
//! code never carries literals.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub thresholds: ThresholdConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// Minimum scores each stage must clear to be treated as authoritative.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThresholdConfig {
    /// Cosine similarity floor for a retrieval candidate.
    pub retrieval_similarity: f64,
    /// Confidence floor for the classifier to win over retrieval.
    pub classifier_confidence: f64,
    /// Confidence floor for the keyword fallback detector.
    pub fallback_confidence: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipelineConfig {
    /// Per-capability-call timeout.
    pub stage_timeout_ms: u64,
    /// Bounded retries for transient capability failures.
    pub max_transport_retries: u32,
    /// Amounts above this always require explicit confirmation, whatever
    /// the confidence.
    pub critical_amount_fcfa: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub stage_timeout_ms: Option<u64>,
    pub retrieval_similarity: Option<f64>,
    pub classifier_confidence: Option<f64>,
    pub fallback_confidence: Option<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdConfig {
                retrieval_similarity: 0.75,
                classifier_confidence: 0.85,
                fallback_confidence: 0.75,
            },
            pipeline: PipelineConfig {
                stage_timeout_ms: 4_000,
                max_transport_retries: 1,
                critical_amount_fcfa: 5_000_000,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("porcher.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(thresholds) = patch.thresholds {
            if let Some(value) = thresholds.retrieval_similarity {
                self.thresholds.retrieval_similarity = value;
            }
            if let Some(value) = thresholds.classifier_confidence {
                self.thresholds.classifier_confidence = value;
            }
            if let Some(value) = thresholds.fallback_confidence {
                self.thresholds.fallback_confidence = value;
            }
        }

        if let Some(pipeline) = patch.pipeline {
            if let Some(value) = pipeline.stage_timeout_ms {
                self.pipeline.stage_timeout_ms = value;
            }
            if let Some(value) = pipeline.max_transport_retries {
                self.pipeline.max_transport_retries = value;
            }
            if let Some(value) = pipeline.critical_amount_fcfa {
                self.pipeline.critical_amount_fcfa = value;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("PORCHER_RETRIEVAL_SIMILARITY") {
            self.thresholds.retrieval_similarity = parse_f64("PORCHER_RETRIEVAL_SIMILARITY", &value)?;
        }
        if let Some(value) = read_env("PORCHER_CLASSIFIER_CONFIDENCE") {
            self.thresholds.classifier_confidence =
                parse_f64("PORCHER_CLASSIFIER_CONFIDENCE", &value)?;
        }
        if let Some(value) = read_env("PORCHER_FALLBACK_CONFIDENCE") {
            self.thresholds.fallback_confidence = parse_f64("PORCHER_FALLBACK_CONFIDENCE", &value)?;
        }
        if let Some(value) = read_env("PORCHER_STAGE_TIMEOUT_MS") {
            self.pipeline.stage_timeout_ms = parse_u64("PORCHER_STAGE_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = read_env("PORCHER_MAX_TRANSPORT_RETRIES") {
            self.pipeline.max_transport_retries =
                parse_u32("PORCHER_MAX_TRANSPORT_RETRIES", &value)?;
        }
        if let Some(value) = read_env("PORCHER_CRITICAL_AMOUNT_FCFA") {
            self.pipeline.critical_amount_fcfa =
                parse_i64("PORCHER_CRITICAL_AMOUNT_FCFA", &value)?;
        }

        let log_level = read_env("PORCHER_LOGGING_LEVEL").or_else(|| read_env("PORCHER_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PORCHER_LOGGING_FORMAT").or_else(|| read_env("PORCHER_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(stage_timeout_ms) = overrides.stage_timeout_ms {
            self.pipeline.stage_timeout_ms = stage_timeout_ms;
        }
        if let Some(value) = overrides.retrieval_similarity {
            self.thresholds.retrieval_similarity = value;
        }
        if let Some(value) = overrides.classifier_confidence {
            self.thresholds.classifier_confidence = value;
        }
        if let Some(value) = overrides.fallback_confidence {
            self.thresholds.fallback_confidence = value;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_threshold("thresholds.retrieval_similarity", self.thresholds.retrieval_similarity)?;
        validate_threshold(
            "thresholds.classifier_confidence",
            self.thresholds.classifier_confidence,
        )?;
        validate_threshold("thresholds.fallback_confidence", self.thresholds.fallback_confidence)?;

        if self.pipeline.stage_timeout_ms == 0 || self.pipeline.stage_timeout_ms > 300_000 {
            return Err(ConfigError::Validation(
                "pipeline.stage_timeout_ms must be in range 1..=300000".to_string(),
            ));
        }
        if self.pipeline.max_transport_retries > 1 {
            return Err(ConfigError::Validation(
                "pipeline.max_transport_retries is bounded at 1".to_string(),
            ));
        }
        if self.pipeline.critical_amount_fcfa <= 0 {
            return Err(ConfigError::Validation(
                "pipeline.critical_amount_fcfa must be greater than zero".to_string(),
            ));
        }

        let level = self.logging.level.trim().to_ascii_lowercase();
        match level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(ConfigError::Validation(
                "logging.level must be one of trace|debug|info|warn|error".to_string(),
            )),
        }
    }
}

fn validate_threshold(name: &str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!("{name} must be in range (0.0, 1.0], got {value}")))
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("porcher.toml"), PathBuf::from("config/porcher.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    toml::from_str::<ConfigPatch>(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_i64(key: &str, value: &str) -> Result<i64, ConfigError> {
    value.parse::<i64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    thresholds: Option<ThresholdPatch>,
    pipeline: Option<PipelinePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ThresholdPatch {
    retrieval_similarity: Option<f64>,
    classifier_confidence: Option<f64>,
    fallback_confidence: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct PipelinePatch {
    stage_timeout_ms: Option<u64>,
    max_transport_retries: Option<u32>,
    critical_amount_fcfa: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    #[test]
    fn defaults_carry_the_documented_thresholds() {
        let config = AppConfig::default();
        assert_eq!(config.thresholds.retrieval_similarity, 0.75);
        assert_eq!(config.thresholds.classifier_confidence, 0.85);
        assert_eq!(config.thresholds.fallback_confidence, 0.75);
        assert_eq!(config.pipeline.max_transport_retries, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PORCHER_STAGE_TIMEOUT_MS", "2500");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("porcher.toml");
            fs::write(
                &path,
                r#"
[thresholds]
classifier_confidence = 0.9

[pipeline]
stage_timeout_ms = 9000

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            if config.thresholds.classifier_confidence != 0.9 {
                return Err("file threshold should win over default".to_string());
            }
            if config.pipeline.stage_timeout_ms != 2_500 {
                return Err("env timeout should win over file".to_string());
            }
            if config.logging.level != "debug" {
                return Err("programmatic override should win over file".to_string());
            }
            Ok(())
        })();

        clear_vars(&["PORCHER_STAGE_TIMEOUT_MS"]);
        result
    }

    #[test]
    fn env_log_format_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PORCHER_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            if config.logging.format != LogFormat::Json {
                return Err("json log format should be set from env".to_string());
            }
            Ok(())
        })();

        clear_vars(&["PORCHER_LOG_FORMAT"]);
        result
    }

    #[test]
    fn out_of_range_threshold_fails_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PORCHER_RETRIEVAL_SIMILARITY", "1.5");

        let result = (|| -> Result<(), String> {
            match AppConfig::load(LoadOptions::default()) {
                Ok(_) => Err("expected validation failure".to_string()),
                Err(ConfigError::Validation(message))
                    if message.contains("thresholds.retrieval_similarity") =>
                {
                    Ok(())
                }
                Err(other) => Err(format!("unexpected error: {other}")),
            }
        })();

        clear_vars(&["PORCHER_RETRIEVAL_SIMILARITY"]);
        result
    }

    #[test]
    fn missing_required_file_is_reported() {
        let error = AppConfig::load(LoadOptions {
            config_path: Some("does/not/exist/porcher.toml".into()),
            require_file: true,
            ..LoadOptions::default()
        })
        .err();

        assert!(matches!(error, Some(ConfigError::MissingConfigFile(_))));
    }
}
