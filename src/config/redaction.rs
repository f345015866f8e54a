//! Redaction configuration

use super::logging::LogLevel;
use crate::redact::{Policy, DEFAULT_MASK_KEYS, DEFAULT_REDACT_KEYS};
use serde::{Deserialize, Serialize};

/// Largest body captured for logging (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Which fields are rewritten and which exchanges are logged at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    /// Field names whose values are replaced by `REDACTED`
    pub redact_keys: Vec<String>,
    /// Field names whose string values are partially starred
    pub mask_keys: Vec<String>,
    /// Request paths (exact match) that are never logged
    pub ignored_paths: Vec<String>,
    /// Bodies above this size are not captured
    pub max_body_bytes: usize,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_keys: DEFAULT_REDACT_KEYS.iter().map(|k| k.to_string()).collect(),
            mask_keys: DEFAULT_MASK_KEYS.iter().map(|k| k.to_string()).collect(),
            ignored_paths: vec!["/health".to_string()],
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl RedactionConfig {
    /// Build the policy; a debug log level switches redaction off.
    pub fn policy(&self, level: LogLevel) -> Policy {
        Policy::new(&self.redact_keys, &self.mask_keys).with_bypass(level.bypasses_redaction())
    }
}
