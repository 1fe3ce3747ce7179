//! Dynamically-typed record values
//!
//! Input rows arrive loosely typed (JSON documents, CSV cells, Parquet rows).
//! Each value is normalised into a [`Value`] variant so coercion can match on
//! `(TypeTag, Value)` pairs instead of inspecting runtime kinds.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single loosely-typed input value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    /// Arrays, objects and anything else without a scalar mapping
    Other(serde_json::Value),
}

/// A flat mapping from column name to value
///
/// A key that is missing and a key mapped to [`Value::Null`] are distinct
/// here, but both produce NULL once coerced.
pub type Record = HashMap<String, Value>;

impl Value {
    /// Whether this is an explicit null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Canonical string rendering
    ///
    /// Numbers and booleans render as their JSON text (`42`, `2.0`, `true`),
    /// text renders unquoted and compound values render as compact JSON.
    pub fn render(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => match serde_json::Number::from_f64(*f) {
                Some(n) => n.to_string(),
                None => f.to_string(),
            },
            Value::Text(s) => s.clone(),
            Value::Other(v) => v.to_string(),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Text(s) => write!(f, "'{}'", s),
            other => write!(f, "{}", other.render()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::Text(s),
            other => Value::Other(other),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Convert a JSON object into a record
///
/// Returns `None` when the value is not an object.
pub fn record_from_json(value: serde_json::Value) -> Option<Record> {
    match value {
        serde_json::Value::Object(map) => Some(
            map.into_iter()
                .map(|(key, value)| (key, Value::from(value)))
                .collect(),
        ),
        _ => None,
    }
}
