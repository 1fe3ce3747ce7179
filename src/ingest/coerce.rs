//! Per-record type validation and coercion

use crate::models::{ErrorPolicy, Record, SchemaCatalog, TypeTag, Value};

use super::IngestError;

const TRUTHY_STRINGS: &[&str] = &["true", "t", "yes", "y", "1"];

/// Result of coercing one record against a catalog
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    /// Accepted row, one value per declared column in declaration order
    Row(Vec<Value>),
    /// Row discarded by the `skip` policy at the named column
    Rejected { column: String },
}

/// Coerce a record into a row matching the catalog's columns
///
/// Missing keys and explicit nulls both yield NULL and are never type
/// checked. Mismatches are resolved by the catalog's [`ErrorPolicy`];
/// only the `error` policy returns `Err`.
pub fn coerce(record: &Record, catalog: &SchemaCatalog) -> Result<Coerced, IngestError> {
    let policy = catalog.error_policy();
    let mut row = Vec::with_capacity(catalog.columns().len());

    for column in catalog.columns() {
        let value = match record.get(&column.name) {
            None | Some(Value::Null) => {
                row.push(Value::Null);
                continue;
            }
            Some(value) => value,
        };

        if accepts(&column.type_tag, value) {
            row.push(value.clone());
            continue;
        }

        match policy {
            ErrorPolicy::Skip => {
                tracing::debug!(
                    "Skipping row: value {} for column '{}' is not of type {}",
                    value,
                    column.name,
                    column.declared_type
                );
                return Ok(Coerced::Rejected {
                    column: column.name.clone(),
                });
            }
            ErrorPolicy::Null => row.push(Value::Null),
            ErrorPolicy::Error => {
                return Err(IngestError::TypeMismatch {
                    column: column.name.clone(),
                    declared_type: column.declared_type.clone(),
                    actual_value: value.to_string(),
                });
            }
            ErrorPolicy::Convert => {
                let converted = convert(&column.type_tag, value);
                if converted.is_null() {
                    tracing::debug!(
                        "Could not convert {} for column '{}' to {}, storing NULL",
                        value,
                        column.name,
                        column.declared_type
                    );
                }
                row.push(converted);
            }
        }
    }

    Ok(Coerced::Row(row))
}

/// Whether a non-null value already satisfies a column type
pub fn accepts(tag: &TypeTag, value: &Value) -> bool {
    match tag {
        TypeTag::Integer => matches!(value, Value::Integer(_)),
        TypeTag::Float => matches!(value, Value::Integer(_) | Value::Float(_)),
        TypeTag::Text => matches!(value, Value::Text(_)),
        TypeTag::Boolean => matches!(value, Value::Boolean(_)),
        TypeTag::Other(_) => true,
    }
}

/// Convert a mismatched value to the target type
///
/// Numeric conversions that fail produce [`Value::Null`]; boolean and text
/// conversions always succeed.
pub fn convert(tag: &TypeTag, value: &Value) -> Value {
    match tag {
        TypeTag::Integer => to_integer(value).map(Value::Integer).unwrap_or(Value::Null),
        TypeTag::Float => to_float(value).map(Value::Float).unwrap_or(Value::Null),
        TypeTag::Boolean => Value::Boolean(to_boolean(value)),
        TypeTag::Text => Value::Text(value.render()),
        TypeTag::Other(_) => value.clone(),
    }
}

fn to_integer(value: &Value) -> Option<i64> {
    let float = match value {
        Value::Integer(i) => return Some(*i),
        Value::Boolean(b) => return Some(i64::from(*b)),
        Value::Float(f) => *f,
        Value::Text(s) => s.trim().parse::<f64>().ok()?,
        Value::Null | Value::Other(_) => return None,
    };
    truncate(float)
}

// i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
fn truncate(float: f64) -> Option<i64> {
    let truncated = float.trunc();
    if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
        Some(truncated as i64)
    } else {
        None
    }
}

fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Text(s) => s.trim().parse::<f64>().ok(),
        Value::Null | Value::Other(_) => None,
    }
}

fn to_boolean(value: &Value) -> bool {
    match value {
        Value::Boolean(b) => *b,
        Value::Text(s) => {
            let lowered = s.to_lowercase();
            TRUTHY_STRINGS.contains(&lowered.as_str())
        }
        Value::Integer(i) => *i != 0,
        Value::Float(f) => *f != 0.0,
        Value::Null => false,
        Value::Other(json) => json_truthy(json),
    }
}

fn json_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(items) => !items.is_empty(),
        serde_json::Value::Object(map) => !map.is_empty(),
    }
}
