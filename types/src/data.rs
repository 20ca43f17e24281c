//! Row and scalar value types received from the query layer

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tsify::Tsify;

/// Text used for a grouping key when the field is null or missing
pub const NULL_KEY: &str = "null";

/// A single result row: field name to scalar
pub type Row = HashMap<String, Value>;

/// A scalar cell value, normalized at the boundary
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(untagged)]
pub enum Value {
    /// Null or missing
    #[default]
    Null,
    /// Boolean flag
    Bool(bool),
    /// Numeric value
    Number(f64),
    /// String value
    Text(String),
}

impl Value {
    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Parse the value as a finite number.
    ///
    /// Text is trimmed before parsing. Booleans and null are not numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Borrow the string contents, if this is text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value as a grouping key
    pub fn to_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str(NULL_KEY),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", number_key(*n)),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Integral values print without a fraction so `5.0` and `5` group together
fn number_key(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
            serde_json::Value::String(s) => Value::Text(s),
            // Nested structures are not scalars; keep their JSON text as an opaque label
            other => Value::Text(other.to_string()),
        }
    }
}

/// Read a field from a row, treating a missing field as null
pub fn field<'a>(row: &'a Row, name: &str) -> &'a Value {
    static NULL: Value = Value::Null;
    row.get(name).unwrap_or(&NULL)
}

/// Normalize a raw JSON object into a row
pub fn row_from_json(object: serde_json::Map<String, serde_json::Value>) -> Row {
    object.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
}
