//! SQLite dialect.
//!
//! SQLite has no `AFTER` positioning and cannot alter a column in place,
//! so a column modification rebuilds the table. Index names are global
//! to the database and therefore carry the table name.

use super::{is_timestamp_keyword, Dialect};
use crate::change::SchemaChange;
use crate::schema::{ColumnSpec, IndexKind};
use crate::value::Scalar;

const RESERVED_DEFINITIONS: &str = "id VARCHAR(36) NOT NULL, \
     created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP, \
     updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP";

/// SQLite dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn table_sql(&self, table: &str, columns: &[ColumnSpec]) -> String {
        let mut sql = format!("CREATE TABLE {table} ({RESERVED_DEFINITIONS}");
        for column in columns {
            sql.push_str(", ");
            sql.push_str(&self.column_definition(column));
        }
        sql.push_str(", PRIMARY KEY (id))");
        sql
    }

    fn create_index(&self, table: &str, column: &str, kind: IndexKind) -> Option<String> {
        let unique = match kind {
            IndexKind::None => return None,
            IndexKind::NonUnique => "",
            IndexKind::Unique => "UNIQUE ",
        };
        Some(format!(
            "CREATE {unique}INDEX {} ON {table} ({column})",
            self.index_name(table, column)
        ))
    }

    fn rebuild(&self, table: &str, columns: &[ColumnSpec]) -> Vec<String> {
        let scratch = format!("{table}__rebuild");
        let names = ["id", "created_at", "updated_at"]
            .into_iter()
            .chain(columns.iter().map(|c| c.name.as_str()))
            .collect::<Vec<_>>()
            .join(", ");

        let mut statements = vec![
            self.table_sql(&scratch, columns),
            format!("INSERT INTO {scratch} ({names}) SELECT {names} FROM {table}"),
            format!("DROP TABLE {table}"),
            format!("ALTER TABLE {scratch} RENAME TO {table}"),
        ];
        statements.extend(
            columns
                .iter()
                .filter_map(|c| self.create_index(table, &c.name, c.index)),
        );
        statements
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn escape_str(&self, raw: &str) -> String {
        raw.replace('\'', "''")
    }

    fn index_name(&self, table: &str, column: &str) -> String {
        format!("index_{table}_{column}").replace('.', "_")
    }

    fn create_table_sql(&self, table: &str) -> String {
        self.table_sql(table, &[])
    }

    fn truncate_sql(&self, table: &str) -> String {
        format!("DELETE FROM {table}")
    }

    fn change_sql(&self, change: &SchemaChange) -> Vec<String> {
        match change {
            SchemaChange::CreateTable { table } => vec![self.create_table_sql(table)],
            SchemaChange::AddColumn { table, column, .. } => {
                let mut statements = vec![format!(
                    "ALTER TABLE {table} ADD COLUMN {}",
                    self.column_definition(column)
                )];
                statements.extend(self.create_index(table, &column.name, column.index));
                statements
            }
            SchemaChange::ModifyColumn {
                table,
                table_columns,
                ..
            } => self.rebuild(table, table_columns),
            SchemaChange::DropColumn {
                table,
                column,
                index,
            } => {
                let mut statements = Vec::new();
                if let Some(name) = index {
                    statements.push(format!("DROP INDEX IF EXISTS {name}"));
                }
                statements.push(format!("ALTER TABLE {table} DROP COLUMN {column}"));
                statements
            }
            SchemaChange::AddIndex {
                table,
                column,
                kind,
            } => self.create_index(table, column, *kind).into_iter().collect(),
            SchemaChange::DropIndex { name, .. } => {
                vec![format!("DROP INDEX IF EXISTS {name}")]
            }
        }
    }

    fn default_literal(&self, value: &Scalar) -> String {
        match value {
            Scalar::Text(s) if is_timestamp_keyword(s) => String::from("CURRENT_TIMESTAMP"),
            Scalar::Text(s) => format!("'{}'", self.escape_str(s)),
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
        }
    }
}
