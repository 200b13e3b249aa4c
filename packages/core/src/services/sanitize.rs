//! Remote Payload Sanitization
//!
//! The remote store's write API rejects explicitly-missing field values.
//! `null` is accepted - the two are not the same thing, and conflating them
//! corrupts data (a `null` annotation audio URL means "no recording", not
//! "field absent").
//!
//! Plain JSON cannot represent a missing value, so payloads assembled by UI
//! surfaces cross into the core as [`FieldValue`], a JSON superset with an
//! explicit [`FieldValue::Missing`] variant. [`sanitize`] rewrites such a
//! payload into clean JSON:
//!
//! - object fields whose value is missing are dropped entirely
//! - array elements that are missing are removed, shifting later elements
//!   down (the array shrinks)
//! - `null` and every other value pass through unchanged
//! - the rewrite recurses into nested objects and arrays at any depth
//!
//! Documents serialized from the crate's own typed models never contain a
//! missing value (optional fields are skipped at serialization time);
//! [`sanitize_document`] runs them through the same path as a boundary
//! check.

use serde_json::{Map, Value};

/// A JSON value extended with an explicitly-missing variant.
///
/// Object entries are kept as an ordered list so field order survives
/// sanitization.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Explicitly missing - rejected by the remote store, dropped here
    Missing,
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<FieldValue>),
    Object(Vec<(String, FieldValue)>),
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => FieldValue::Number(n),
            Value::String(s) => FieldValue::String(s),
            Value::Array(items) => {
                FieldValue::Array(items.into_iter().map(FieldValue::from).collect())
            }
            Value::Object(entries) => FieldValue::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, FieldValue::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Rewrite a payload into JSON the remote store accepts.
///
/// Returns `None` when the value itself is missing (a missing top-level
/// document is nothing to write at all).
pub fn sanitize(value: FieldValue) -> Option<Value> {
    match value {
        FieldValue::Missing => None,
        FieldValue::Null => Some(Value::Null),
        FieldValue::Bool(b) => Some(Value::Bool(b)),
        FieldValue::Number(n) => Some(Value::Number(n)),
        FieldValue::String(s) => Some(Value::String(s)),
        FieldValue::Array(items) => {
            Some(Value::Array(items.into_iter().filter_map(sanitize).collect()))
        }
        FieldValue::Object(entries) => {
            let mut map = Map::new();
            for (key, value) in entries {
                if let Some(clean) = sanitize(value) {
                    map.insert(key, clean);
                }
            }
            Some(Value::Object(map))
        }
    }
}

/// Boundary check for documents that are already valid JSON.
///
/// Values serialized from the crate's typed models cannot contain a missing
/// value, so this is an identity rewrite; it exists so every upload goes
/// through one sanitization path regardless of where the payload came from.
pub fn sanitize_document(value: Value) -> Value {
    sanitize(FieldValue::from(value)).unwrap_or(Value::Null)
}
