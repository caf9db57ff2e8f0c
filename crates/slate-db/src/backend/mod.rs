//! Engine backends.
//!
//! A backend owns exactly one live connection and knows how to run text
//! statements on it, decode rows into [`Record`]s and read table
//! structure. Statements are sent with the text protocol
//! ([`sqlx::raw_sql`]), never prepared.

mod mysql;
mod sqlite;

pub use mysql::MySqlBackend;
pub use sqlite::SqliteBackend;

use std::future::Future;

use slate_sql_core::dialect::Dialect;

use crate::config::DbConfig;
use crate::error::Result;
use crate::introspect::LiveColumn;
use crate::record::Record;

/// A single database connection on one engine.
///
/// Futures are `Send` so a [`Database`](crate::Database) can be driven
/// from a multi-threaded runtime.
pub trait Backend: Sized + Send {
    /// Engine name used in logs.
    const NAME: &'static str;

    /// Statement listing the tables of the current database, one name
    /// per row in the first column.
    const TABLES_SQL: &'static str;

    /// Opens a connection and selects the configured database.
    fn connect(config: &DbConfig) -> impl Future<Output = Result<Self>> + Send;

    /// SQL dialect of this engine.
    fn dialect() -> &'static dyn Dialect;

    /// Statement listing the columns of `table`; the first statement
    /// [`Backend::describe`] sends.
    fn columns_sql(table: &str) -> String;

    /// Runs a statement and returns the number of affected rows.
    fn execute(&mut self, sql: &str) -> impl Future<Output = Result<u64>> + Send;

    /// Runs a query and decodes every row.
    fn fetch_all(&mut self, sql: &str) -> impl Future<Output = Result<Vec<Record>>> + Send;

    /// Live columns of `table` in table order, with their indexes.
    fn describe(&mut self, table: &str) -> impl Future<Output = Result<Vec<LiveColumn>>> + Send;
}
