//! Engine-specific SQL generation.
//!
//! Clause builders and the sanitizer only need literal escaping from a
//! dialect. The schema synchronizer additionally needs DDL: every
//! [`SchemaChange`] is turned into the statements that apply it on the
//! target engine.

mod mysql;
mod sqlite;

pub use mysql::MySqlDialect;
pub use sqlite::SqliteDialect;

use crate::change::SchemaChange;
use crate::schema::{ColumnSpec, IndexKind};
use crate::value::Scalar;

/// Trait for engine-specific literal escaping and DDL generation.
pub trait Dialect: Send + Sync {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Escapes a string for use between single quotes.
    fn escape_str(&self, raw: &str) -> String;

    /// Name given to the single-column index on `table.column`.
    fn index_name(&self, table: &str, column: &str) -> String;

    /// Creates a table holding only the reserved columns.
    fn create_table_sql(&self, table: &str) -> String;

    /// Removes every row of a table.
    fn truncate_sql(&self, table: &str) -> String;

    /// Statements applying a schema change, in execution order.
    fn change_sql(&self, change: &SchemaChange) -> Vec<String>;

    /// Renders `name TYPE NULL|NOT NULL[ DEFAULT x]`.
    fn column_definition(&self, column: &ColumnSpec) -> String {
        let mut sql = format!(
            "{} {} {}",
            column.name,
            column.engine_type,
            if column.nullable { "NULL" } else { "NOT NULL" }
        );
        if let Some(default) = &column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.default_literal(default));
        }
        sql
    }

    /// Renders a column default. Timestamp keywords stay bare, numbers
    /// are unquoted, text is quoted.
    fn default_literal(&self, value: &Scalar) -> String {
        match value {
            Scalar::Text(s) if is_timestamp_keyword(s) => s.trim().to_ascii_uppercase(),
            Scalar::Text(s) => format!("'{}'", self.escape_str(s)),
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
        }
    }
}

pub(crate) fn is_timestamp_keyword(raw: &str) -> bool {
    let raw = raw.trim();
    raw.eq_ignore_ascii_case("CURRENT_TIMESTAMP") || raw.eq_ignore_ascii_case("NOW()")
}

pub(crate) fn index_keyword(kind: IndexKind) -> Option<&'static str> {
    match kind {
        IndexKind::None => None,
        IndexKind::NonUnique => Some("INDEX"),
        IndexKind::Unique => Some("UNIQUE"),
    }
}
