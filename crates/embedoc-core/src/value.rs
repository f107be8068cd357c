//! # Raw Values
//!
//! Embedded data is stored by the host as untyped JSON: a single object for
//! a one-to-one embedding, or an array of objects for a collection. This
//! module names those shapes and provides the small predicates the rest of
//! the workspace shares.

use serde_json::{Map, Value};

/// A raw key-to-value map backing one document.
pub type RawAttributes = Map<String, Value>;

/// Returns `true` when a value counts as blank for presence checks.
///
/// `null`, whitespace-only strings, empty arrays and empty objects are
/// blank. `false` and `0` are present.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Returns the JSON kind name of a value for error messages.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Borrow a raw value as an attribute map, if it is one.
pub fn as_attributes(value: &Value) -> Option<&RawAttributes> {
    value.as_object()
}
