//! Payload checks against a resource's declared fields: allow-list projection,
//! required-field detection and import-time type coercion.

use crate::config::{Field, ResourceConfig, ValueType};
use serde_json::{Map, Value};

/// Null, or a string that is empty after trimming.
pub fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Keep only keys declared in `fields`, in field order. Unknown keys are dropped silently.
pub fn project<'a>(resource: &'a ResourceConfig, payload: &Map<String, Value>) -> Vec<(&'a Field, Value)> {
    resource
        .fields
        .iter()
        .filter_map(|f| payload.get(f.key.as_str()).map(|v| (f, v.clone())))
        .collect()
}

/// Labels of required fields that are absent, null or blank in `row`.
pub fn missing_required<'a>(resource: &'a ResourceConfig, row: &Map<String, Value>) -> Vec<&'a str> {
    resource
        .fields
        .iter()
        .filter(|f| f.required)
        .filter(|f| row.get(f.key.as_str()).map(is_blank).unwrap_or(true))
        .map(|f| f.label.as_str())
        .collect()
}

/// `true`, `1`, `"true"` and `"1"` (any case) are true; everything else is false.
pub fn coerce_bool(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::String(s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("true") || s == "1"
        }
        _ => false,
    }
}

/// Convert an externally supplied cell into the shape the field's column expects.
/// Null stays null for every type.
pub fn coerce(field: &Field, value: Value) -> Value {
    if value.is_null() {
        return value;
    }
    match field.value_type {
        ValueType::Json => match value {
            Value::String(s) => {
                serde_json::from_str(&s).unwrap_or_else(|_| Value::Object(Map::new()))
            }
            other => other,
        },
        ValueType::Boolean => Value::Bool(coerce_bool(&value)),
        ValueType::Number => match value {
            Value::String(s) => {
                let t = s.trim();
                if let Ok(i) = t.parse::<i64>() {
                    Value::from(i)
                } else if let Some(n) = t.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
                    Value::Number(n)
                } else {
                    Value::String(s)
                }
            }
            other => other,
        },
        t if t.is_textual() => match value {
            Value::Number(n) => Value::String(n.to_string()),
            Value::Bool(b) => Value::String(b.to_string()),
            other => other,
        },
        _ => value,
    }
}

/// Typed conversion for create and update payloads. Unlike [`coerce`], a value that
/// cannot take the field's type is rejected instead of replaced.
pub fn coerce_for_write(field: &Field, value: Value) -> Result<Value, String> {
    match field.value_type {
        ValueType::Json => match value {
            Value::String(s) => serde_json::from_str(&s)
                .map_err(|_| format!("{} must be valid JSON", field.label)),
            other => Ok(other),
        },
        ValueType::Number => match coerce(field, value) {
            v @ (Value::Null | Value::Number(_)) => Ok(v),
            _ => Err(format!("{} must be a number", field.label)),
        },
        ValueType::Boolean => Ok(coerce(field, value)),
        _ => Ok(value),
    }
}
