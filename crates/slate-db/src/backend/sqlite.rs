//! SQLite backend.

use std::str::FromStr;

use slate_sql_core::dialect::{Dialect, SqliteDialect};
use slate_sql_core::schema::IndexKind;
use slate_sql_core::value::Scalar;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, ConnectOptions, Row, TypeInfo, ValueRef};
use tracing::debug;

use super::Backend;
use crate::config::DbConfig;
use crate::error::{DbError, Result};
use crate::introspect::LiveColumn;
use crate::record::Record;

/// Database name that opens a private in-memory database.
pub const MEMORY: &str = ":memory:";

/// A single SQLite connection.
#[derive(Debug)]
pub struct SqliteBackend {
    conn: SqliteConnection,
}

/// Single-column index read from `PRAGMA index_list`/`index_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnIndex {
    name: String,
    column: String,
    kind: IndexKind,
}

impl Backend for SqliteBackend {
    const NAME: &'static str = "sqlite";
    const TABLES_SQL: &'static str = "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";

    async fn connect(config: &DbConfig) -> Result<Self> {
        let options = if config.database == MEMORY {
            SqliteConnectOptions::from_str("sqlite::memory:").map_err(DbError::Connect)?
        } else {
            SqliteConnectOptions::new()
                .filename(&config.database)
                .create_if_missing(true)
        };
        let conn = options.connect().await.map_err(DbError::Connect)?;
        Ok(Self { conn })
    }

    fn dialect() -> &'static dyn Dialect {
        &SqliteDialect
    }

    fn columns_sql(table: &str) -> String {
        format!("PRAGMA table_info({table})")
    }

    async fn execute(&mut self, sql: &str) -> Result<u64> {
        debug!(sql = %sql, "executing");
        let done = sqlx::Executor::execute(&mut self.conn, sqlx::raw_sql(sql))
            .await
            .map_err(|e| DbError::statement(sql, e))?;
        Ok(done.rows_affected())
    }

    async fn fetch_all(&mut self, sql: &str) -> Result<Vec<Record>> {
        debug!(sql = %sql, "querying");
        let rows = sqlx::Executor::fetch_all(&mut self.conn, sqlx::raw_sql(sql))
            .await
            .map_err(|e| DbError::statement(sql, e))?;
        rows.iter()
            .map(decode_row)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| DbError::statement(sql, e))
    }

    async fn describe(&mut self, table: &str) -> Result<Vec<LiveColumn>> {
        let columns = self.fetch_all(&Self::columns_sql(table)).await?;
        let index_list = self.fetch_all(&format!("PRAGMA index_list({table})")).await?;

        let mut indexes = Vec::new();
        for index in &index_list {
            // the implicit index behind PRIMARY KEY (id)
            if index.text("origin") == Some("pk") {
                continue;
            }
            let Some(name) = index.text("name") else {
                continue;
            };
            let info = self.fetch_all(&format!("PRAGMA index_info({name})")).await?;
            let [part] = info.as_slice() else {
                continue;
            };
            let Some(column) = part.text("name") else {
                continue;
            };
            indexes.push(ColumnIndex {
                name: name.to_string(),
                column: column.to_string(),
                kind: if index.int("unique") == Some(1) {
                    IndexKind::Unique
                } else {
                    IndexKind::NonUnique
                },
            });
        }
        Ok(live_columns(&columns, &indexes))
    }
}

fn decode_row(row: &SqliteRow) -> std::result::Result<Record, sqlx::Error> {
    let mut record = Record::new();
    for column in row.columns() {
        let i = column.ordinal();
        let raw = row.try_get_raw(i)?;
        let value = if raw.is_null() {
            None
        } else {
            // storage class of the value, not the declared column type
            Some(match raw.type_info().name() {
                "INTEGER" => Scalar::Int(row.try_get_unchecked::<i64, _>(i)?),
                "REAL" => Scalar::Float(row.try_get_unchecked::<f64, _>(i)?),
                "BLOB" => Scalar::Text(
                    String::from_utf8_lossy(&row.try_get_unchecked::<Vec<u8>, _>(i)?).into_owned(),
                ),
                _ => Scalar::Text(row.try_get_unchecked::<String, _>(i)?),
            })
        };
        record.push(column.name(), value);
    }
    Ok(record)
}

/// Reads `PRAGMA table_info` rows.
fn live_columns(columns: &[Record], indexes: &[ColumnIndex]) -> Vec<LiveColumn> {
    columns
        .iter()
        .filter_map(|row| {
            let name = row.text("name")?;
            let index = indexes.iter().find(|i| i.column == name);
            Some(LiveColumn::new(
                name,
                row.text("type").unwrap_or_default(),
                row.int("notnull") != Some(1),
                parse_default(row.text("dflt_value")),
                index.map_or(IndexKind::None, |i| i.kind),
                index.map(|i| i.name.clone()),
            ))
        })
        .collect()
}

/// `dflt_value` holds the default as written in the DDL: quoted text,
/// a bare number or a keyword.
fn parse_default(raw: Option<&str>) -> Option<Scalar> {
    let raw = raw?.trim();
    if raw.eq_ignore_ascii_case("NULL") {
        return None;
    }
    match raw.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')) {
        Some(inner) => Some(Scalar::Text(inner.replace("''", "'"))),
        None => Some(Scalar::Text(raw.to_string())),
    }
}
