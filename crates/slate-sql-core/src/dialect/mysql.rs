//! MySQL dialect.

use super::{index_keyword, Dialect};
use crate::change::SchemaChange;

/// MySQL / MariaDB dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn add_index(&self, table: &str, column: &str, keyword: &str) -> String {
        format!(
            "ALTER TABLE {table} ADD {keyword} {} ({column})",
            self.index_name(table, column)
        )
    }
}

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn escape_str(&self, raw: &str) -> String {
        let mut escaped = String::with_capacity(raw.len());
        for c in raw.chars() {
            match c {
                '\0' => escaped.push_str("\\0"),
                '\n' => escaped.push_str("\\n"),
                '\r' => escaped.push_str("\\r"),
                '\\' => escaped.push_str("\\\\"),
                '\'' => escaped.push_str("\\'"),
                '"' => escaped.push_str("\\\""),
                '\x1a' => escaped.push_str("\\Z"),
                c => escaped.push(c),
            }
        }
        escaped
    }

    fn index_name(&self, _table: &str, column: &str) -> String {
        // index names are per table in MySQL
        format!("index_{column}")
    }

    fn create_table_sql(&self, table: &str) -> String {
        format!(
            "CREATE TABLE {table} (\
             id VARCHAR(36) NOT NULL, \
             created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP, \
             updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP, \
             PRIMARY KEY (id))"
        )
    }

    fn truncate_sql(&self, table: &str) -> String {
        format!("TRUNCATE TABLE {table}")
    }

    fn change_sql(&self, change: &SchemaChange) -> Vec<String> {
        match change {
            SchemaChange::CreateTable { table } => vec![self.create_table_sql(table)],
            SchemaChange::AddColumn {
                table,
                column,
                after,
            } => {
                let mut sql = format!(
                    "ALTER TABLE {table} ADD {} AFTER {after}",
                    self.column_definition(column)
                );
                if let Some(keyword) = index_keyword(column.index) {
                    sql.push_str(&format!(
                        ", ADD {keyword} {} ({})",
                        self.index_name(table, &column.name),
                        column.name
                    ));
                }
                vec![sql]
            }
            SchemaChange::ModifyColumn { table, column, .. } => vec![format!(
                "ALTER TABLE {table} MODIFY {}",
                self.column_definition(column)
            )],
            SchemaChange::DropColumn { table, column, .. } => {
                vec![format!("ALTER TABLE {table} DROP COLUMN {column}")]
            }
            SchemaChange::AddIndex {
                table,
                column,
                kind,
            } => index_keyword(*kind)
                .map(|keyword| self.add_index(table, column, keyword))
                .into_iter()
                .collect(),
            SchemaChange::DropIndex { table, name, .. } => {
                vec![format!("ALTER TABLE {table} DROP INDEX {name}")]
            }
        }
    }
}
