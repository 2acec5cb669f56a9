//! Query result types for glance-board.
//!
//! Defines the structures used to represent query results from the database.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the result of executing a SQL query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryResult {
    /// Column names, in result order.
    pub columns: Vec<String>,

    /// Column type names, parallel to `columns`.
    pub column_types: Vec<String>,

    /// Rows of data. Every row has exactly `columns.len()` cells.
    pub rows: Vec<Row>,

    /// Number of rows in the result. Always equals `rows.len()`.
    pub row_count: usize,

    /// Time taken to execute the query, in milliseconds.
    pub execution_time_ms: u64,
}

impl QueryResult {
    /// Creates a new empty query result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query result with the given columns and rows.
    ///
    /// Column types are inferred from the first row, or reported as
    /// `Unknown` when there are no rows.
    pub fn with_data(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let column_types = match rows.first() {
            Some(first) => first.iter().map(|v| v.type_name().to_string()).collect(),
            None => vec!["Unknown".to_string(); columns.len()],
        };
        let row_count = rows.len();
        Self {
            columns,
            column_types,
            rows,
            row_count,
            execution_time_ms: 0,
        }
    }

    /// Sets the execution time.
    pub fn with_execution_time_ms(mut self, millis: u64) -> Self {
        self.execution_time_ms = millis;
        self
    }

    /// Returns true if the result set is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolves a column name to its index by exact match.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Checks the shape invariants: parallel column types, rectangular rows
    /// and a row count that matches the rows.
    pub fn is_well_formed(&self) -> bool {
        self.column_types.len() == self.columns.len()
            && self.row_count == self.rows.len()
            && self.rows.iter().all(|r| r.len() == self.columns.len())
    }
}

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// Represents a single value from a database query.
///
/// Serialized as a plain JSON value so results and persisted documents
/// read naturally.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer (up to i64).
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Text/string value.
    String(String),

    /// Structured value (arrays, objects).
    Json(serde_json::Value),
}

impl Value {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for integer and float values.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Converts the value to the string shown in result grids.
    ///
    /// NULL renders as `NULL` and structured values as compact JSON.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Json(j) => j.to_string(),
        }
    }

    /// Converts the value to a chart label. NULL becomes the empty string.
    pub fn to_label(&self) -> String {
        match self {
            Value::Null => String::new(),
            other => other.to_display_string(),
        }
    }

    /// Coerces the value to a number for chart series.
    ///
    /// Numeric strings are parsed, booleans map to 1/0, and anything that is
    /// not numeric (including NULL and NaN) becomes 0.
    pub fn to_number(&self) -> f64 {
        let n = match self {
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            Value::Null | Value::Json(_) => 0.0,
        };
        if n.is_finite() {
            n
        } else {
            0.0
        }
    }

    /// Returns a short type name, used when the backend reports no type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Boolean",
            Value::Int(_) => "Integer",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Json(serde_json::Value::Array(_)) => "Array",
            Value::Json(_) => "Object",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

// Conversion implementations for common types
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::String(s),
            structured => Value::Json(structured),
        }
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}
