//! Type-erased values walked by the sanitizer.
//!
//! Anything that reaches the log goes through [`Value`] first. Bodies decoded
//! from the wire arrive as `serde_json::Value`, application types arrive via
//! [`Value::from_serialize`], and raw buffers are carried as-is until the
//! sanitizer decides to decode them.

use axum::body::Bytes;
use serde::Serialize;
use std::collections::BTreeMap;

/// A dynamically typed value the sanitizer can traverse.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Sequence(Vec<Value>),
    Mapping(BTreeMap<String, Value>),
    /// Indirection to another value. `None` models a reference to nothing.
    Reference(Option<Box<Value>>),
    /// Opaque bytes presumed to hold a JSON document.
    Buffer(Bytes),
}

impl Value {
    /// Convert any serializable type into a traversable value.
    ///
    /// `Option::None` fields become [`Value::Null`]; use [`Value::reference`]
    /// and [`Value::null_reference`] when indirection must be kept explicit.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Value::from)
    }

    /// Wrap a value behind a reference.
    pub fn reference(value: Value) -> Self {
        Value::Reference(Some(Box::new(value)))
    }

    /// A reference that points at nothing.
    pub fn null_reference() -> Self {
        Value::Reference(None)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for `Null` and for a reference to nothing.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Null | Value::Reference(None))
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Mapping(
                entries
                    .into_iter()
                    .map(|(name, entry)| (name, Value::from(entry)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value.into())
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::Buffer(value)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Value::Mapping(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Card {
        number: String,
        code: u32,
        holder: Option<String>,
    }

    #[test]
    fn test_from_json_builds_matching_shape() {
        let value = Value::from(json!({"a": [1, "x", null], "b": {"c": true}}));

        let Value::Mapping(entries) = value else {
            panic!("expected mapping");
        };
        assert_eq!(
            entries["a"],
            Value::Sequence(vec![
                Value::from(1),
                Value::from("x"),
                Value::Null
            ])
        );
        assert_eq!(
            entries["b"],
            [("c", Value::Bool(true))].into_iter().collect::<Value>()
        );
    }

    #[test]
    fn test_from_serialize_uses_field_names() {
        let card = Card {
            number: "4111".to_string(),
            code: 123,
            holder: None,
        };

        let value = Value::from_serialize(&card).unwrap();
        let Value::Mapping(entries) = value else {
            panic!("expected mapping");
        };
        assert_eq!(entries["number"], Value::from("4111"));
        assert_eq!(entries["code"], Value::from(123));
        assert!(entries["holder"].is_null());
    }

    #[test]
    fn test_nullish() {
        assert!(Value::Null.is_nullish());
        assert!(Value::null_reference().is_nullish());
        assert!(!Value::reference(Value::Null).is_nullish());
        assert!(!Value::from("x").is_nullish());
    }
}
