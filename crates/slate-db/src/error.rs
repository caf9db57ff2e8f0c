//! Error types for the database provider.

use slate_sql_core::BuildError;

/// Errors that can occur while talking to the database.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A required environment variable is not set.
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),

    /// The connection settings are unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The server could not be reached or refused the login.
    #[error("could not connect: {0}")]
    Connect(#[source] sqlx::Error),

    /// Connected, but the database could not be selected.
    #[error("could not select database '{database}': {source}")]
    SelectDatabase {
        /// Database name.
        database: String,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },

    /// A statement was rejected by the server.
    #[error("{message} (sql: {sql})")]
    Statement {
        /// Statement text as sent.
        sql: String,
        /// Server message.
        message: String,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },

    /// The statement could not be built from the given input.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// IO error (reading a schema file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A schema file is not valid JSON.
    #[error("invalid schema file: {0}")]
    Json(#[from] serde_json::Error),
}

impl DbError {
    /// Wraps a driver error raised by `sql`, keeping the server message.
    pub(crate) fn statement(sql: &str, source: sqlx::Error) -> Self {
        let message = match &source {
            sqlx::Error::Database(err) => err.message().to_string(),
            other => other.to_string(),
        };
        Self::Statement {
            sql: sql.to_string(),
            message,
            source,
        }
    }

    /// Returns `true` when the connection cannot be trusted anymore and
    /// the next call should reconnect from scratch.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Connect(_) | Self::SelectDatabase { .. } => true,
            Self::Statement { source, .. } => is_connection_error(source),
            _ => false,
        }
    }

    /// The statement that failed, if the error came from the server.
    #[must_use]
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Statement { sql, .. } => Some(sql),
            _ => None,
        }
    }
}

/// Driver errors after which the connection is considered lost.
#[must_use]
pub fn is_connection_error(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolClosed
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::WorkerCrashed
    )
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DbError>;
