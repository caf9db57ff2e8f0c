//! Connection settings.
//!
//! Settings come from four environment variables, read once when the
//! first connection is opened:
//!
//! | Variable  | Meaning                                         |
//! |-----------|-------------------------------------------------|
//! | `DB_HOST` | server host, optionally `host:/path/to/socket` |
//! | `DB_USER` | user name                                       |
//! | `DB_PASS` | password                                        |
//! | `DB_NAME` | database name (file path for SQLite)            |

use std::fmt;

use crate::error::{DbError, Result};

/// Host variable.
pub const HOST_VAR: &str = "DB_HOST";
/// User variable.
pub const USER_VAR: &str = "DB_USER";
/// Password variable.
pub const PASS_VAR: &str = "DB_PASS";
/// Database name variable.
pub const NAME_VAR: &str = "DB_NAME";

/// Resolved connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Server host name.
    pub host: String,
    /// Unix socket path split off the host value.
    pub socket: Option<String>,
    /// User name.
    pub user: String,
    /// Password.
    pub password: String,
    /// Database name, or file path for SQLite.
    pub database: String,
}

impl DbConfig {
    /// Builds settings from the four raw values. The host may carry a
    /// `:socket` suffix.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the database name is blank.
    pub fn new(
        host: impl AsRef<str>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Result<Self> {
        let (host, socket) = match host.as_ref().split_once(':') {
            Some((host, socket)) => (host.trim(), Some(socket.trim().to_string())),
            None => (host.as_ref().trim(), None),
        };
        let database = database.into();
        if database.trim().is_empty() {
            return Err(DbError::Config(String::from("database name is empty")));
        }
        Ok(Self {
            host: host.to_string(),
            socket: socket.filter(|s| !s.is_empty()),
            user: user.into(),
            password: password.into(),
            database,
        })
    }

    /// Settings for a SQLite database file, or `:memory:`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if `path` is blank.
    pub fn sqlite(path: impl Into<String>) -> Result<Self> {
        Self::new("localhost", "", "", path)
    }

    /// Builds settings from optional values; every one must be present
    /// and non-blank.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::MissingEnv`] naming the first missing or blank
    /// value.
    pub fn from_parts(
        host: Option<String>,
        user: Option<String>,
        password: Option<String>,
        database: Option<String>,
    ) -> Result<Self> {
        Self::new(
            required(host, HOST_VAR)?,
            required(user, USER_VAR)?,
            required(password, PASS_VAR)?,
            required(database, NAME_VAR)?,
        )
    }

    /// Reads `DB_HOST`, `DB_USER`, `DB_PASS` and `DB_NAME`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::MissingEnv`] naming the first unset or blank
    /// variable.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Same as [`DbConfig::from_parts`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Self::from_parts(
            lookup(HOST_VAR),
            lookup(USER_VAR),
            lookup(PASS_VAR),
            lookup(NAME_VAR),
        )
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(DbError::MissingEnv(name))
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("socket", &self.socket)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}
