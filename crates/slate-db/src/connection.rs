//! The connection manager.
//!
//! A [`Database`] owns at most one live connection. It connects lazily
//! on first use, reuses the connection for every later call and drops it
//! after a connection-level failure so the next call reconnects from
//! scratch. It also keeps the diagnostics of the last call.

use slate_sql_core::dialect::Dialect;
use tracing::{info, warn};

use crate::backend::Backend;
use crate::config::DbConfig;
use crate::error::{DbError, Result};
use crate::record::Record;

enum ConfigSource {
    /// Read the environment on first connect.
    Env,
    /// Explicit or already resolved settings.
    Given(DbConfig),
}

/// Single-connection database handle.
pub struct Database<B: Backend> {
    source: ConfigSource,
    conn: Option<B>,
    last_query: Option<String>,
    last_error: Option<String>,
    last_total: Option<u64>,
}

impl<B: Backend> Database<B> {
    /// Creates a handle configured from `DB_HOST`, `DB_USER`, `DB_PASS`
    /// and `DB_NAME`, read when the first connection is opened.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ConfigSource::Env)
    }

    /// Creates a handle with explicit settings.
    #[must_use]
    pub fn with_config(config: DbConfig) -> Self {
        Self::new(ConfigSource::Given(config))
    }

    fn new(source: ConfigSource) -> Self {
        Self {
            source,
            conn: None,
            last_query: None,
            last_error: None,
            last_total: None,
        }
    }

    fn resolve_config(&mut self) -> Result<DbConfig> {
        match &self.source {
            ConfigSource::Given(config) => Ok(config.clone()),
            ConfigSource::Env => {
                let config = DbConfig::from_env()?;
                self.source = ConfigSource::Given(config.clone());
                Ok(config)
            }
        }
    }

    /// Returns the open connection, connecting first if needed.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error when the settings cannot be
    /// resolved, or with [`DbError::Connect`]/[`DbError::SelectDatabase`]
    /// when the server refuses.
    pub async fn connect(&mut self) -> Result<&mut B> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => {
                let config = self.resolve_config()?;
                info!(
                    backend = B::NAME,
                    host = %config.host,
                    database = %config.database,
                    "connecting"
                );
                B::connect(&config).await?
            }
        };
        Ok(self.conn.insert(conn))
    }

    /// Closes the connection; the next call reconnects.
    pub fn disconnect(&mut self) {
        self.conn = None;
    }

    /// Returns `true` while a connection is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// SQL dialect of the backend.
    #[must_use]
    pub fn dialect(&self) -> &'static dyn Dialect {
        B::dialect()
    }

    /// Runs a query, recording it as the last query.
    ///
    /// # Errors
    ///
    /// Connection errors, or [`DbError::Statement`] carrying `sql` and the
    /// server message.
    pub async fn query(&mut self, sql: &str) -> Result<Vec<Record>> {
        self.begin(sql);
        let result = match self.connect().await {
            Ok(conn) => conn.fetch_all(sql).await,
            Err(e) => Err(e),
        };
        self.settle(result)
    }

    /// Runs a statement, recording it as the last query, and returns the
    /// number of affected rows.
    ///
    /// # Errors
    ///
    /// Same as [`Database::query`].
    pub async fn execute(&mut self, sql: &str) -> Result<u64> {
        self.begin(sql);
        let result = match self.connect().await {
            Ok(conn) => conn.execute(sql).await,
            Err(e) => Err(e),
        };
        self.settle(result)
    }

    /// Starts a call: `sql` becomes the last query and the previous
    /// error is forgotten.
    pub(crate) fn begin(&mut self, sql: &str) {
        self.last_query = Some(sql.to_string());
        self.last_error = None;
    }

    /// Records a failure as the last error, dropping the connection when
    /// it is no longer usable.
    pub(crate) fn settle<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            self.last_error = Some(match err {
                DbError::Statement { message, .. } => message.clone(),
                other => other.to_string(),
            });
            if err.is_connectivity() && self.conn.take().is_some() {
                warn!(backend = B::NAME, error = %err, "connection lost");
            }
        }
        result
    }

    pub(crate) fn set_last_total(&mut self, total: Option<u64>) {
        self.last_total = total;
    }

    /// The last statement sent.
    #[must_use]
    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    /// Server message of the last failure.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Unlimited row count of the last `select`.
    #[must_use]
    pub fn last_total(&self) -> Option<u64> {
        self.last_total
    }
}
