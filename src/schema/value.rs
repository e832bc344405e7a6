use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Validated, schema-shaped payload handed to the rendering service.
///
/// Records carry exactly the keys of their specification; array fields are
/// lists of records in instance order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StructuredValue {
    Null,
    Text(String),
    Number(Number),
    List(Vec<StructuredValue>),
    Record(BTreeMap<String, StructuredValue>),
}

impl StructuredValue {
    /// Integral values become JSON integers so `30.0` goes out as `30`.
    pub fn number(value: f64) -> Self {
        if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            return StructuredValue::Number(Number::from(value as i64));
        }
        Number::from_f64(value)
            .map(StructuredValue::Number)
            .unwrap_or(StructuredValue::Null)
    }

    pub fn get(&self, key: &str) -> Option<&StructuredValue> {
        match self {
            StructuredValue::Record(fields) => fields.get(key),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[StructuredValue]> {
        match self {
            StructuredValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            StructuredValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StructuredValue::Number(number) => number.as_f64(),
            _ => None,
        }
    }

    pub fn keys(&self) -> Vec<&str> {
        match self {
            StructuredValue::Record(fields) => fields.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            StructuredValue::Null => Value::Null,
            StructuredValue::Text(text) => Value::String(text.clone()),
            StructuredValue::Number(number) => Value::Number(number.clone()),
            StructuredValue::List(items) => {
                Value::Array(items.iter().map(StructuredValue::to_json).collect())
            }
            StructuredValue::Record(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}
