//! Decoded result rows.

use chrono::NaiveDateTime;
use serde::ser::{Serialize, SerializeMap, Serializer};
use slate_sql_core::value::Scalar;

/// Format of `TIMESTAMP`/`DATETIME` values as both engines print them.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One result row: column names in select order mapped to nullable
/// scalars.
///
/// Serializes as a JSON object with the columns in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Option<Scalar>)>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column.
    pub fn push(&mut self, column: impl Into<String>, value: Option<Scalar>) {
        self.fields.push((column.into(), value));
    }

    /// Appends a column, builder style.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: Option<Scalar>) -> Self {
        self.push(column, value);
        self
    }

    /// Value of a column; `None` if the column is absent or NULL.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, value)| value.as_ref())
    }

    /// Returns `true` if the row has the column, NULL or not.
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == column)
    }

    /// Text value of a column.
    #[must_use]
    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Scalar::as_str)
    }

    /// Integer value of a column, parsing numeric text.
    #[must_use]
    pub fn int(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(Scalar::as_i64)
    }

    /// Float value of a column, parsing numeric text.
    #[must_use]
    pub fn float(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Scalar::as_f64)
    }

    /// Timestamp value of a column such as `created_at`.
    #[must_use]
    pub fn timestamp(&self, column: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(self.text(column)?.trim(), TIMESTAMP_FORMAT).ok()
    }

    /// The row's `id`.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.get("id").map(ToString::to_string)
    }

    /// Value of the first column; aggregates select a single one.
    #[must_use]
    pub fn first(&self) -> Option<&Scalar> {
        self.fields.first().and_then(|(_, value)| value.as_ref())
    }

    /// Iterates over columns in select order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Scalar>)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
