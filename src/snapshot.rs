//! Raw snapshot helpers
//!
//! The realtime store delivers each change as a full point-in-time JSON
//! snapshot of the subscribed subtree. Projection mappers treat an absent
//! subtree (`null`) as "no data yet" and map it to an empty result; a
//! snapshot that is present but not a key/value tree is a malformed
//! snapshot, reported distinctly so it can be logged rather than silently
//! shown as empty.

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while interpreting a raw snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot (or a required subtree) is not a key/value tree.
    #[error("malformed snapshot at '{path}': expected an object, found {found}")]
    Malformed { path: String, found: &'static str },
}

/// Short type name for error messages.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Interpret a snapshot node as an optional object.
///
/// `Null` means the subtree does not exist yet and yields `None`; any
/// other non-object value is a malformed snapshot.
pub fn as_object<'a>(
    value: &'a Value,
    path: &str,
) -> Result<Option<&'a Map<String, Value>>, SnapshotError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(SnapshotError::Malformed {
            path: path.to_string(),
            found: kind_of(other),
        }),
    }
}

/// Coerce an arbitrary snapshot value to a boolean flag, matching the
/// truthiness rules the store's JavaScript clients apply: `null` and
/// absent are false, numbers are true unless zero, strings are true
/// unless empty, objects and arrays are always true.
pub fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Fetch a string field with an empty-string default.
pub fn string_or_empty(value: &Value, field: &str) -> String {
    value
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

/// Fetch a boolean field with a `false` default.
pub fn bool_or_false(value: &Value, field: &str) -> bool {
    value.get(field).and_then(Value::as_bool).unwrap_or(false)
}
