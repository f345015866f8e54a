//! Recursive traversal that produces the loggable copy of a value.

use super::mask::mask;
use super::policy::{FieldRule, Policy, PLAIN_TEXT_KEY, REDACTED};
use super::value::Value;
use serde_json::{Map, Value as Json};

/// Produce a sanitized copy of `value` under `policy`.
///
/// Rules, per entry of every mapping (field names match case-insensitively
/// at any depth):
///
/// - a redacted name replaces the whole value with `"REDACTED"`, without
///   descending into it; a null value stays null
/// - a masked name masks string leaves, and number leaves over their decimal
///   rendering; structured values are descended into
/// - any other name keeps its value, descending into structures
///
/// A string with no field name (the root, or an element of a root sequence)
/// is wrapped as `{"plain/text-type": ...}`. A buffer that is not valid JSON
/// sanitizes to null. A reference to nothing sanitizes to `{}`.
///
/// # Examples
///
/// ```
/// use veil::redact::{sanitize, Policy, Value};
/// use serde_json::json;
///
/// let policy = Policy::new(["password"], ["document"]);
/// let body = Value::from(json!({"user": "ana", "password": "hunter2", "document": "58707647000"}));
///
/// assert_eq!(
///     sanitize(&policy, &body),
///     json!({"user": "ana", "password": "REDACTED", "document": "5870****000"})
/// );
/// ```
pub fn sanitize(policy: &Policy, value: &Value) -> Json {
    walk(policy, value, None)
}

/// Convenience for values that are already JSON.
pub fn sanitize_json(policy: &Policy, value: &Json) -> Json {
    sanitize(policy, &Value::from(value.clone()))
}

fn walk(policy: &Policy, value: &Value, field: Option<&str>) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Buffer(bytes) => match serde_json::from_slice::<Json>(bytes) {
            Ok(decoded) => walk(policy, &Value::from(decoded), field),
            Err(e) => {
                tracing::debug!(error = %e, len = bytes.len(), "Dropping undecodable buffer from log");
                Json::Null
            }
        },
        Value::String(text) if field.is_none() => plain_text(text),
        Value::Sequence(items) => Json::Array(
            items
                .iter()
                .map(|item| walk(policy, item, field))
                .collect(),
        ),
        Value::Reference(Some(inner)) => walk(policy, inner, field),
        Value::Reference(None) => Json::Object(Map::new()),
        Value::Mapping(entries) => Json::Object(
            entries
                .iter()
                .map(|(name, entry)| (name.clone(), sanitize_field(policy, name, entry)))
                .collect(),
        ),
        Value::Bool(_) | Value::Number(_) | Value::String(_) => match field {
            Some(name) if policy.rule_for(name) == FieldRule::Mask => mask_scalar(value),
            _ => scalar(value),
        },
    }
}

fn sanitize_field(policy: &Policy, name: &str, value: &Value) -> Json {
    match policy.rule_for(name) {
        FieldRule::Redact if !value.is_nullish() => Json::String(REDACTED.to_string()),
        _ => walk(policy, value, Some(name)),
    }
}

fn mask_scalar(value: &Value) -> Json {
    match value {
        Value::String(text) => Json::String(mask(text)),
        Value::Number(n) => Json::String(mask(&n.to_string())),
        other => scalar(other),
    }
}

fn scalar(value: &Value) -> Json {
    match value {
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => Json::Number(n.clone()),
        Value::String(s) => Json::String(s.clone()),
        _ => Json::Null,
    }
}

fn plain_text(text: &str) -> Json {
    let mut wrapped = Map::new();
    wrapped.insert(PLAIN_TEXT_KEY.to_string(), Json::String(text.to_string()));
    Json::Object(wrapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use serde_json::json;

    fn keys(redact: &[&str], mask: &[&str]) -> Policy {
        Policy::new(redact, mask)
    }

    #[test]
    fn test_null_root() {
        assert_eq!(sanitize(&Policy::default_keys(), &Value::Null), Json::Null);
    }

    #[test]
    fn test_root_string_is_wrapped() {
        let out = sanitize(&Policy::default_keys(), &Value::from("password=hunter2"));
        assert_eq!(out, json!({"plain/text-type": "password=hunter2"}));
    }

    #[test]
    fn test_root_scalars_pass_through() {
        let policy = Policy::default_keys();
        assert_eq!(sanitize(&policy, &Value::from(42)), json!(42));
        assert_eq!(sanitize(&policy, &Value::from(true)), json!(true));
    }

    #[test]
    fn test_buffer_is_decoded_then_sanitized() {
        let buffer = Value::Buffer(Bytes::from_static(br#"{"password":"x","ok":1}"#));
        let out = sanitize(&keys(&["password"], &[]), &buffer);
        assert_eq!(out, json!({"password": "REDACTED", "ok": 1}));
    }

    #[test]
    fn test_invalid_buffer_becomes_null() {
        let buffer = Value::Buffer(Bytes::from_static(b"not json {"));
        assert_eq!(sanitize(&Policy::default_keys(), &buffer), Json::Null);
    }

    #[test]
    fn test_redacted_structure_is_replaced_wholesale() {
        let body = Value::from(json!({"credentials": {"user": "a", "pin": "1234"}, "id": 7}));
        let out = sanitize(&keys(&["credentials"], &["user"]), &body);
        assert_eq!(out, json!({"credentials": "REDACTED", "id": 7}));
    }

    #[test]
    fn test_redacted_null_stays_null() {
        let body = Value::from(json!({"password": null}));
        assert_eq!(
            sanitize(&keys(&["password"], &[]), &body),
            json!({"password": null})
        );
    }

    #[test]
    fn test_redacted_nil_reference_renders_as_empty_mapping() {
        let body: Value = [("password", Value::null_reference())].into_iter().collect();
        assert_eq!(
            sanitize(&keys(&["password"], &[]), &body),
            json!({"password": {}})
        );
    }

    #[test]
    fn test_masked_number_becomes_masked_string() {
        let body = Value::from(json!({"document": 58707647000u64}));
        assert_eq!(
            sanitize(&keys(&[], &["document"]), &body),
            json!({"document": "5870****000"})
        );
    }

    #[test]
    fn test_masked_bool_passes_through() {
        let body = Value::from(json!({"cpf": true}));
        assert_eq!(sanitize(&keys(&[], &["cpf"]), &body), json!({"cpf": true}));
    }

    #[test]
    fn test_mask_key_on_structure_descends() {
        let body = Value::from(json!({"document": {"number": "123456", "password": "x"}}));
        let out = sanitize(&keys(&["password"], &["document"]), &body);
        assert_eq!(out, json!({"document": {"number": "123456", "password": "REDACTED"}}));
    }

    #[test]
    fn test_sequence_elements_inherit_field_name() {
        let body = Value::from(json!({"cpf": ["12345678901", "10987654321"]}));
        let out = sanitize(&keys(&[], &["cpf"]), &body);
        assert_eq!(out, json!({"cpf": ["1234****901", "1098****321"]}));
    }

    #[test]
    fn test_redacted_sequence_is_replaced_wholesale() {
        let body = Value::from(json!({"tokens": ["a", "b"]}));
        let out = sanitize(&keys(&["tokens"], &[]), &body);
        assert_eq!(out, json!({"tokens": "REDACTED"}));
    }

    #[test]
    fn test_root_sequence_of_records() {
        let body = Value::from(json!([{"password": "a"}, {"password": "b", "n": 1}]));
        let out = sanitize(&keys(&["password"], &[]), &body);
        assert_eq!(out, json!([{"password": "REDACTED"}, {"password": "REDACTED", "n": 1}]));
    }

    #[test]
    fn test_root_sequence_strings_are_wrapped() {
        let body = Value::from(json!(["a", 1]));
        let out = sanitize(&Policy::empty(), &body);
        assert_eq!(out, json!([{"plain/text-type": "a"}, 1]));
    }

    #[test]
    fn test_reference_is_followed_with_field_name() {
        let body: Value = [("cpf", Value::reference(Value::from("12345678901")))]
            .into_iter()
            .collect();
        let out = sanitize(&keys(&[], &["cpf"]), &body);
        assert_eq!(out, json!({"cpf": "1234****901"}));
    }

    #[test]
    fn test_redacted_reference_is_replaced() {
        let body: Value = [("password", Value::reference(Value::from("x")))]
            .into_iter()
            .collect();
        let out = sanitize(&keys(&["password"], &[]), &body);
        assert_eq!(out, json!({"password": "REDACTED"}));
    }

    #[test]
    fn test_bypass_keeps_redacted_fields_but_still_masks() {
        let body = Value::from(json!({"password": "hunter2", "cpf": "12345678901"}));
        let policy = keys(&["password"], &["cpf"]).with_bypass(true);
        assert_eq!(
            sanitize(&policy, &body),
            json!({"password": "hunter2", "cpf": "1234****901"})
        );
    }

    #[test]
    fn test_sanitize_json_matches_sanitize() {
        let raw = json!({"Password": "p", "inner": {"PASSWORD": "q"}});
        let policy = keys(&["password"], &[]);
        assert_eq!(
            sanitize_json(&policy, &raw),
            json!({"Password": "REDACTED", "inner": {"PASSWORD": "REDACTED"}})
        );
    }
}
