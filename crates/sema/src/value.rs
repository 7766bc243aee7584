use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A caller-supplied attribute value. The store keeps a single text column;
/// the variant only records which Rust type produced the text, nothing is
/// enforced on read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Str(String),
    I64(i64),
    F64(f64),
    Bool(bool),
}

impl MetaValue {
    /// Text form written to the `value` column.
    pub fn as_text(&self) -> String {
        match self {
            MetaValue::Str(value) => value.clone(),
            MetaValue::I64(value) => value.to_string(),
            MetaValue::F64(value) => value.to_string(),
            MetaValue::Bool(value) => value.to_string(),
        }
    }

    /// Accepts the scalar JSON shapes a filter item may carry. Nulls,
    /// arrays, and objects have no text form here and yield `None`.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::String(value) => Some(MetaValue::Str(value.clone())),
            JsonValue::Bool(value) => Some(MetaValue::Bool(*value)),
            JsonValue::Number(value) => match value.as_i64() {
                Some(int) => Some(MetaValue::I64(int)),
                None => value.as_f64().map(MetaValue::F64),
            },
            _ => None,
        }
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Str(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Str(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::I64(value)
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        MetaValue::F64(value)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Bool(value)
    }
}
