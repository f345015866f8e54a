//! Redact command implementation

use crate::capture::{BodyRecord, CapturedBody};
use crate::cli::serve::load_config_file;
use crate::cli::RedactArgs;
use crate::redact::Policy;
use serde_json::Value as Json;
use std::io::Read;

/// Handle `veil redact` command
///
/// The policy comes from the config file (plus `VEIL_*` overrides) extended
/// with the keys given on the command line.
pub fn handle_redact(args: &RedactArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = load_config_file(&args.config)?;
    config.validate()?;

    let mut policy = config.policy();
    policy.add_redact_keys(&args.redact_keys);
    policy.add_mask_keys(&args.mask_keys);
    for key in policy.overlapping_keys() {
        eprintln!("Warning: '{}' is both redacted and masked; redaction wins", key);
    }

    let input = match &args.file {
        Some(path) => std::fs::read(path)?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };

    let (sanitized, decode_error) = redact_document(&policy, input);
    if let Some(e) = decode_error {
        eprintln!("Warning: input is not JSON ({}); logged as plain text", e);
    }

    let rendered = if args.compact {
        serde_json::to_string(&sanitized)?
    } else {
        serde_json::to_string_pretty(&sanitized)?
    };
    Ok(rendered)
}

/// Sanitize raw document bytes the way an exchange body is sanitized.
///
/// Input that is not JSON comes back wrapped as plain text, along with the
/// decode error.
pub fn redact_document(policy: &Policy, input: Vec<u8>) -> (Json, Option<String>) {
    let (record, error) = BodyRecord::from_capture(Ok(CapturedBody::new(input)));
    (record.sanitize(policy), error.map(|e| e.to_string()))
}
