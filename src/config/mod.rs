//! Configuration module for veil
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`VEIL_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use veil::config::VeilConfig;
//!
//! let toml = r#"
//! [redaction]
//! mask_keys = ["iban"]
//! "#;
//! let config: VeilConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.redaction.mask_keys, vec!["iban"]);
//! assert_eq!(config.server.port, 8080);
//! ```

pub mod error;
pub mod logging;
pub mod redaction;
pub mod server;

pub use error::ConfigError;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use redaction::{RedactionConfig, DEFAULT_MAX_BODY_BYTES};
pub use server::ServerConfig;

use crate::redact::Policy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for veil.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VeilConfig {
    /// Listener for `veil serve`
    pub server: ServerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Redaction keys, ignored paths and capture limit
    pub redaction: RedactionConfig,
}

impl VeilConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports VEIL_* environment variables for common settings.
    /// Key lists are comma-separated and replace the configured list.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        // Server settings
        if let Ok(port) = std::env::var("VEIL_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(host) = std::env::var("VEIL_HOST") {
            self.server.host = host;
        }

        // Logging settings
        if let Ok(level) = std::env::var("VEIL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("VEIL_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        // Redaction keys
        if let Ok(keys) = std::env::var("VEIL_REDACT_KEYS") {
            self.redaction.redact_keys = split_list(&keys);
        }
        if let Ok(keys) = std::env::var("VEIL_MASK_KEYS") {
            self.redaction.mask_keys = split_list(&keys);
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "port must be non-zero",
            ));
        }

        if self.redaction.max_body_bytes == 0 {
            return Err(ConfigError::validation(
                "redaction.max_body_bytes",
                "limit must be non-zero",
            ));
        }

        for (field, keys) in [
            ("redaction.redact_keys", &self.redaction.redact_keys),
            ("redaction.mask_keys", &self.redaction.mask_keys),
        ] {
            if let Some(i) = keys.iter().position(|k| k.trim().is_empty()) {
                return Err(ConfigError::validation(
                    format!("{}[{}]", field, i),
                    "key cannot be empty",
                ));
            }
        }

        for (i, path) in self.redaction.ignored_paths.iter().enumerate() {
            if !path.starts_with('/') {
                return Err(ConfigError::validation(
                    format!("redaction.ignored_paths[{}]", i),
                    format!("'{}' must start with '/'", path),
                ));
            }
        }

        Ok(())
    }

    /// Redaction policy for the configured keys and log level.
    pub fn policy(&self) -> Policy {
        self.redaction.policy(self.logging.log_level())
    }
}

/// Serializes tests that read or write `VEIL_*` variables.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
