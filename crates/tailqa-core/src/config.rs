//! Pipeline configuration management
//!
//! Handles configuration from environment variables with sensible
//! defaults for local runs. Paths are rooted at a single data directory
//! so no stage hardcodes absolute locations.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    /// Directory layout for pipeline inputs and outputs
    pub paths: PathsConfig,

    /// QA model backend configuration
    pub qa: QaBackendConfig,

    /// Translation backend configuration
    pub translator: TranslatorConfig,

    /// Scoring configuration
    pub scoring: ScoringConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl PipelineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(root) = std::env::var("TAILQA_DATA_DIR") {
            config.paths.data_dir = PathBuf::from(root);
        }
        if let Ok(dir) = std::env::var("TAILQA_RESULTS_DIR") {
            config.paths.results_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("TAILQA_EVAL_DIR") {
            config.paths.eval_dir = PathBuf::from(dir);
        }

        if let Ok(url) = std::env::var("TAILQA_QA_URL") {
            config.qa.endpoint = url;
        }
        if let Ok(model) = std::env::var("TAILQA_QA_MODEL") {
            config.qa.model = model;
        }
        if let Ok(key) = std::env::var("TAILQA_QA_API_KEY") {
            config.qa.api_key = Some(key);
        }
        if let Ok(secs) = std::env::var("TAILQA_QA_TIMEOUT_SECS") {
            config.qa.timeout_secs = secs.parse().map_err(|_| ConfigError::InvalidValue {
                key: "TAILQA_QA_TIMEOUT_SECS".to_string(),
                value: secs,
            })?;
        }

        if let Ok(url) = std::env::var("TAILQA_TRANSLATOR_URL") {
            config.translator.endpoint = url;
        }
        if let Ok(millis) = std::env::var("TAILQA_TRANSLATOR_PAUSE_MS") {
            config.translator.pause_ms = millis.parse().map_err(|_| ConfigError::InvalidValue {
                key: "TAILQA_TRANSLATOR_PAUSE_MS".to_string(),
                value: millis,
            })?;
        }

        if let Ok(threshold) = std::env::var("TAILQA_THRESHOLD") {
            let value: f64 = threshold.parse().map_err(|_| ConfigError::InvalidValue {
                key: "TAILQA_THRESHOLD".to_string(),
                value: threshold.clone(),
            })?;
            // written to also reject NaN
            if !(value > 0.0 && value < 1.0) {
                return Err(ConfigError::InvalidValue {
                    key: "TAILQA_THRESHOLD".to_string(),
                    value: threshold,
                });
            }
            config.scoring.threshold = Some(value);
        }

        if let Ok(level) = std::env::var("TAILQA_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }
}

/// Directory layout for pipeline inputs and outputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root for corpus inputs (articles, category CSVs, properties, questions)
    pub data_dir: PathBuf,

    /// Root for extraction results (JSONL result stores)
    pub results_dir: PathBuf,

    /// Root for evaluation outputs (gold files, score CSVs, reports)
    pub eval_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            results_dir: PathBuf::from("results"),
            eval_dir: PathBuf::from("eval"),
        }
    }
}

/// Extractive-QA backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaBackendConfig {
    /// HTTP endpoint of the QA inference service
    pub endpoint: String,

    /// Model identifier passed to the service
    pub model: String,

    /// Optional bearer token
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for QaBackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8500/qa".to_string(),
            model: "gelectra-qa-de".to_string(),
            api_key: None,
            timeout_secs: 120,
        }
    }
}

/// Translation backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// HTTP endpoint of the translation service
    pub endpoint: String,

    /// Target language code
    pub target_lang: String,

    /// Pause between calls to stay under the service rate limit
    pub pause_ms: u64,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8600/translate".to_string(),
            target_lang: "de".to_string(),
            pause_ms: 300,
        }
    }
}

/// Scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScoringConfig {
    /// Optional confidence threshold for the thresholded metric variants
    pub threshold: Option<f64>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
