//! TOML configuration loading.
//!
//! Every document in the workspace is deserialized through [`ConfigLoader`],
//! blanket-implemented for any `DeserializeOwned` type. Controller files
//! carry a `[shared]` section ([`SharedConfig`]) naming the instance and
//! its log verbosity.
//!
//! ```rust,no_run
//! use hyact_common::config::{ConfigError, ConfigLoader};
//! use hyact_common::control::config::ControllerConfig;
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let cfg = ControllerConfig::load(Path::new("pendulum.toml"))?;
//!     cfg.validate()?;
//!     println!("{} runs {} modes", cfg.shared.service_name, cfg.allocator.mode_count);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Failure to obtain a usable configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// No file at the given path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// Unreadable file, malformed TOML or unknown key.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Well-formed document with an out-of-range or inconsistent value.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log verbosity, lowercase in TOML (`log_level = "debug"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Per-mode costs on every step.
    Trace,
    /// Accepted and rejected mode switches.
    Debug,
    /// Construction summary and engaged modes.
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// `[shared]` section: instance identity and log verbosity.
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "hyact-pendulum-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SharedConfig {
    #[serde(default)]
    pub log_level: LogLevel,

    /// Name reported in logs.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_service_name() -> String {
    "hyact".to_string()
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Rejects an empty `service_name`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// TOML loading for any deserializable config type.
///
/// Missing files map to `FileNotFound`; read failures, syntax errors and
/// unknown keys map to `ParseError`. Semantic checks are left to the type's
/// own `validate()`.
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        tracing::debug!("loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound,
            _ => ConfigError::ParseError(format!("{}: {e}", path.display())),
        })?;
        Self::from_toml_str(&content)
    }

    fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

// ─── Tests ──────────────────────────────────────────────────────────
