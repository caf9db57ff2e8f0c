//! Scalar SQL values and ordered column/value lists.
//!
//! Only strings, integers and floats can be rendered into a statement.
//! There is no boolean conversion: callers that need one
//! must choose an integer or string encoding themselves.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::{BuildError, Result};

/// A plain scalar value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Integer value, rendered unquoted.
    Int(i64),
    /// Float value, rendered unquoted.
    Float(f64),
    /// Text value, rendered quoted and escaped.
    Text(String),
}

impl Scalar {
    /// Converts a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ValueShape`] for booleans, nulls, arrays,
    /// objects and numbers outside the `i64`/`f64` range.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(Self::Text(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Self::Float(f))
                } else {
                    Err(BuildError::ValueShape(format!("number {n} is out of range")))
                }
            }
            other => Err(BuildError::ValueShape(format!(
                "expected a string, integer or float, got {}",
                json_kind(other)
            ))),
        }
    }

    /// Returns the value as an integer if it is one, or is numeric text
    /// holding a whole number.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            Self::Float(_) => None,
            Self::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            }
        }
    }

    /// Returns the value as a float if it is numeric.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        }
    }

    /// Returns the text if this is a text value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<f32> for Scalar {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(String::from(value))
    }
}

impl From<&String> for Scalar {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

/// An ordered list of column/value pairs used by INSERT and UPDATE.
///
/// Setting a column twice replaces the earlier value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values {
    entries: Vec<(String, Scalar)>,
}

impl Values {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a column value, builder style.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.insert(column, value);
        self
    }

    /// Sets a column value in place.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Scalar>) {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    /// Puts a column first, replacing any existing value for it.
    pub fn prepend(&mut self, column: impl Into<String>, value: impl Into<Scalar>) {
        let column = column.into();
        self.entries.retain(|(name, _)| *name != column);
        self.entries.insert(0, (column, value.into()));
    }

    /// Returns the value for a column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Returns `true` if the column is present.
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// Iterates over the pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no column is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds a list from a JSON object whose values are all scalars.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ValueShape`] if `value` is not an object or
    /// holds a non-scalar value.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(BuildError::ValueShape(format!(
                "expected an object of column values, got {}",
                json_kind(value)
            )));
        };
        let mut values = Self::new();
        for (column, inner) in map {
            let scalar = Scalar::from_json(inner).map_err(|e| match e {
                BuildError::ValueShape(msg) => {
                    BuildError::ValueShape(format!("column '{column}': {msg}"))
                }
                other => other,
            })?;
            values.insert(column.as_str(), scalar);
        }
        Ok(values)
    }
}

impl<K: Into<String>, V: Into<Scalar>> FromIterator<(K, V)> for Values {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (column, value) in iter {
            values.insert(column, value);
        }
        values
    }
}

pub(crate) const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
