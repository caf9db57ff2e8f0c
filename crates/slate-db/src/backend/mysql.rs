//! MySQL / MariaDB backend.

use std::collections::HashMap;

use slate_sql_core::dialect::{Dialect, MySqlDialect};
use slate_sql_core::sanitize::sanitize_identifier;
use slate_sql_core::schema::IndexKind;
use slate_sql_core::value::Scalar;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column, ConnectOptions, Row, TypeInfo, ValueRef};
use tracing::debug;

use super::Backend;
use crate::config::DbConfig;
use crate::error::{DbError, Result};
use crate::introspect::LiveColumn;
use crate::record::Record;

/// A single MySQL connection.
#[derive(Debug)]
pub struct MySqlBackend {
    conn: MySqlConnection,
}

impl Backend for MySqlBackend {
    const NAME: &'static str = "mysql";
    const TABLES_SQL: &'static str = "SHOW TABLES";

    async fn connect(config: &DbConfig) -> Result<Self> {
        let mut options = MySqlConnectOptions::new()
            .host(&config.host)
            .username(&config.user)
            .password(&config.password);
        if let Some(socket) = &config.socket {
            options = options.socket(socket);
        }
        let mut conn = options.connect().await.map_err(DbError::Connect)?;

        let select = format!("USE `{}`", sanitize_identifier(&config.database)?);
        sqlx::Executor::execute(&mut conn, sqlx::raw_sql(&select))
            .await
            .map_err(|source| DbError::SelectDatabase {
                database: config.database.clone(),
                source,
            })?;
        Ok(Self { conn })
    }

    fn dialect() -> &'static dyn Dialect {
        &MySqlDialect
    }

    fn columns_sql(table: &str) -> String {
        format!("SHOW COLUMNS FROM {table}")
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
        let indexes = self.fetch_all(&format!("SHOW INDEX FROM {table}")).await?;
        Ok(live_columns(&columns, &indexes))
    }
}

/// Rows arrive in the text protocol: every value is read as bytes and
/// numeric column types are parsed back into numbers.
fn decode_row(row: &MySqlRow) -> std::result::Result<Record, sqlx::Error> {
    let mut record = Record::new();
    for column in row.columns() {
        let i = column.ordinal();
        if row.try_get_raw(i)?.is_null() {
            record.push(column.name(), None);
            continue;
        }
        let bytes = row.try_get_unchecked::<Vec<u8>, _>(i)?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        record.push(column.name(), Some(typed_scalar(column.type_info().name(), text)));
    }
    Ok(record)
}

fn typed_scalar(type_name: &str, text: String) -> Scalar {
    let type_name = type_name.to_ascii_uppercase();
    if type_name.contains("INT") || type_name == "BOOLEAN" || type_name == "YEAR" {
        if let Ok(i) = text.trim().parse::<i64>() {
            return Scalar::Int(i);
        }
    } else if type_name.contains("FLOAT")
        || type_name.contains("DOUBLE")
        || type_name.contains("DECIMAL")
    {
        if let Ok(f) = text.trim().parse::<f64>() {
            return Scalar::Float(f);
        }
    }
    Scalar::Text(text)
}

/// Reads `SHOW COLUMNS` rows, taking index names from `SHOW INDEX`.
///
/// The `Key` flag decides the index kind; only single-column indexes are
/// attributed to a column by name.
fn live_columns(columns: &[Record], indexes: &[Record]) -> Vec<LiveColumn> {
    let mut parts: HashMap<&str, usize> = HashMap::new();
    for index in indexes {
        if let Some(key) = index.text("Key_name") {
            *parts.entry(key).or_default() += 1;
        }
    }
    let single_column_index = |column: &str| -> Option<(String, IndexKind)> {
        indexes.iter().find_map(|index| {
            let key = index.text("Key_name")?;
            if key == "PRIMARY" || parts.get(key) != Some(&1) || index.text("Column_name")? != column
            {
                return None;
            }
            let kind = if index.int("Non_unique") == Some(0) {
                IndexKind::Unique
            } else {
                IndexKind::NonUnique
            };
            Some((key.to_string(), kind))
        })
    };

    columns
        .iter()
        .filter_map(|row| {
            let name = row.text("Field")?;
            let flagged = match row.text("Key") {
                Some("UNI") => IndexKind::Unique,
                Some("MUL") => IndexKind::NonUnique,
                _ => IndexKind::None,
            };
            let (index, index_name) = match single_column_index(name) {
                Some((key, kind)) => (kind, Some(key)),
                None => (flagged, None),
            };
            Some(LiveColumn::new(
                name,
                row.text("Type").unwrap_or_default(),
                row.text("Null").is_some_and(|n| n.eq_ignore_ascii_case("YES")),
                row.get("Default").map(|d| Scalar::Text(d.to_string())),
                index,
                index_name,
            ))
        })
        .collect()
}
