//! Configuration module for synkbot
//!
//! Loads configuration from a TOML file with the structure:
//! - [default] - General settings (log_level)
//! - [synkctl] - Device utility settings
//! - [llm] - Language model endpoint settings
//!
//! Every section is optional; missing values fall back to defaults.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Log level for the application
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing LevelFilter string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub default: DefaultConfig,
    #[serde(default)]
    pub synkctl: SynkctlConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

/// General application settings
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DefaultConfig {
    /// Log level: TRACE, DEBUG, INFO, WARN, ERROR
    #[serde(default)]
    pub log_level: LogLevel,
}

/// synkctl invocation settings
#[derive(Debug, Deserialize, Clone)]
pub struct SynkctlConfig {
    /// Program name or path of the inverter-control utility
    #[serde(default = "default_command")]
    pub command: String,

    /// Upper bound for a single invocation (e.g., "30s")
    #[serde(default = "default_synkctl_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for SynkctlConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            timeout: default_synkctl_timeout(),
        }
    }
}

fn default_command() -> String {
    "synkctl".to_string()
}

fn default_synkctl_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Language model settings
#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// Base URL of the Ollama server
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model name as known to the server
    #[serde(default = "default_model")]
    pub model: String,

    /// Timeout for one chat request (e.g., "2m")
    #[serde(default = "default_llm_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Maximum number of tool-calling rounds per question
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,

    /// Maximum number of messages remembered per session
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Replaces the built-in system prompt
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            timeout: default_llm_timeout(),
            max_tool_rounds: default_max_tool_rounds(),
            history_limit: default_history_limit(),
            system_prompt: None,
        }
    }
}

fn default_endpoint() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_model() -> String {
    "qwen3:4b-q4_K_M".to_string()
}

fn default_llm_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_max_tool_rounds() -> usize {
    8
}

fn default_history_limit() -> usize {
    40
}

impl Config {
    /// Load configuration from TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the config.toml file
    ///
    /// # Errors
    /// Returns error if file cannot be read, parsed or validated
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(
                path.to_string_lossy().to_string(),
            ));
        }

        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration logic (semantic validation beyond type checks)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.synkctl.command.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "synkctl.command must not be empty".to_string(),
            ));
        }

        if self.synkctl.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "synkctl.timeout must be greater than zero".to_string(),
            ));
        }

        if self.llm.endpoint.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.endpoint must not be empty".to_string(),
            ));
        }

        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.model must not be empty".to_string(),
            ));
        }

        if self.llm.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "llm.timeout must be greater than zero".to_string(),
            ));
        }

        if self.llm.max_tool_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "llm.max_tool_rounds must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read configuration file: {0}")]
    ReadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
