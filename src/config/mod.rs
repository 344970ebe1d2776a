//! Configuration management for survey-sync
//!
//! This module handles loading, parsing, and validating configuration from
//! YAML files and environment variables. The host application owns wiring;
//! the crate only consumes the parsed values.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Response store configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Upload endpoint configuration
    #[serde(default)]
    pub uploader: UploaderConfig,

    /// Sync engine tuning
    #[serde(default)]
    pub sync: SyncConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        // First, expand environment variables in the YAML string
        let expanded = expand_env_vars(yaml);
        serde_yaml::from_str(&expanded)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse YAML: {}", e)))
    }

    /// Load configuration from environment variables with prefix SURVEY_SYNC_
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Ok(path) = std::env::var("SURVEY_SYNC_DATABASE_PATH") {
            config.database.path = path;
        }

        if let Ok(endpoint) = std::env::var("SURVEY_SYNC_UPLOADER_ENDPOINT") {
            config.uploader.endpoint = Some(endpoint);
        }
        if let Ok(timeout) = std::env::var("SURVEY_SYNC_UPLOADER_TIMEOUT_SECS") {
            config.uploader.timeout_secs = timeout
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid uploader timeout".to_string()))?;
        }

        if let Ok(max_retry) = std::env::var("SURVEY_SYNC_MAX_RETRY_COUNT") {
            config.sync.max_retry_count = max_retry
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid max retry count".to_string()))?;
        }

        if let Ok(level) = std::env::var("SURVEY_SYNC_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }
}

/// Response store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "/data/surveys/responses.db".to_string()
}

/// Upload endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploaderConfig {
    /// Collection endpoint URL; required to construct the HTTP uploader
    pub endpoint: Option<String>,

    /// Transport deadline in seconds
    #[serde(default = "default_upload_timeout")]
    pub timeout_secs: u64,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_upload_timeout(),
        }
    }
}

fn default_upload_timeout() -> u64 {
    30
}

/// Sync engine and cleanup tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncConfig {
    /// Upper bound on retry_count before a record fails permanently
    #[serde(default = "default_max_retry_count")]
    pub max_retry_count: u32,

    /// Consecutive retryable failures that trip the degradation early stop
    #[serde(default = "default_consecutive_failure_threshold")]
    pub consecutive_failure_threshold: u32,

    /// Base of the exponential backoff schedule in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Ceiling of the backoff schedule in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Exponent cap of the backoff schedule
    #[serde(default = "default_max_backoff_exponent")]
    pub max_backoff_exponent: u32,

    /// Age in milliseconds after which synced rows are deleted
    #[serde(default = "default_retention_window_ms")]
    pub retention_window_ms: i64,

    /// Pending count at which cleanup should be triggered
    #[serde(default = "default_cleanup_threshold")]
    pub cleanup_threshold: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_retry_count: default_max_retry_count(),
            consecutive_failure_threshold: default_consecutive_failure_threshold(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            max_backoff_exponent: default_max_backoff_exponent(),
            retention_window_ms: default_retention_window_ms(),
            cleanup_threshold: default_cleanup_threshold(),
        }
    }
}

fn default_max_retry_count() -> u32 {
    5
}

fn default_consecutive_failure_threshold() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    1000
}

fn default_max_backoff_ms() -> u64 {
    60_000
}

fn default_max_backoff_exponent() -> u32 {
    5
}

fn default_retention_window_ms() -> i64 {
    7 * 24 * 60 * 60 * 1000 // 7 days
}

fn default_cleanup_threshold() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Configuration error types
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Error reading configuration file
    #[error("Failed to read configuration file: {0}")]
    FileRead(String),

    /// Error parsing configuration
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Missing required configuration
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

/// Expand environment variables in a string
///
/// Supports `${VAR_NAME}` syntax
fn expand_env_vars(input: &str) -> String {
    let re = regex_lite::Regex::new(r"\$\{([^}]+)\}")
        .expect("Invalid regex pattern for environment variable expansion");

    re.replace_all(input, |caps: &regex_lite::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}
