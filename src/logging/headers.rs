//! Header flattening ahead of redaction

use crate::redact::{sanitize, Policy, Value};
use axum::http::HeaderMap;
use serde_json::Value as Json;
use std::collections::BTreeMap;

/// Flatten a header multimap, keeping the first value of each name.
///
/// Names come out lowercase, as `http` stores them. Values that are not
/// valid UTF-8 are rendered lossily.
pub fn normalize_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut flat = BTreeMap::new();
    for name in headers.keys() {
        if let Some(value) = headers.get(name) {
            flat.insert(
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
    }
    flat
}

/// Normalized headers passed through the redactor, keyed by header name.
pub fn sanitize_headers(policy: &Policy, headers: &HeaderMap) -> Json {
    let value: Value = normalize_headers(headers)
        .into_iter()
        .map(|(name, value)| (name, Value::String(value)))
        .collect();
    sanitize(policy, &value)
}
