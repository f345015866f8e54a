//! # Redaction Engine
//!
//! Rewrites sensitive fields before anything reaches the log sink.
//!
//! Two independent rules are keyed by field name (case-insensitive, matched
//! at any depth, no paths or wildcards):
//!
//! - **redaction** replaces the value with `"REDACTED"`
//! - **masking** keeps the outer thirds of a string and stars the middle
//!
//! Input is converted once into the closed [`Value`] type and walked by
//! [`sanitize`], which always returns a fresh `serde_json::Value`.

pub mod mask;
pub mod policy;
pub mod sanitize;
pub mod value;

pub use mask::{mask, MASK_CHAR};
pub use policy::{
    FieldRule, Policy, DEFAULT_MASK_KEYS, DEFAULT_REDACT_KEYS, PLAIN_TEXT_KEY, REDACTED,
};
pub use sanitize::{sanitize, sanitize_json};
pub use value::Value;
