//! Single-connection database provider.
//!
//! `slate-db` runs the statements built by `slate-sql-core` over one
//! lazily opened connection (MySQL or SQLite) and adds:
//! - **CRUD** - `select`, `get`, `count`, `sum`, `has`, `insert`,
//!   `update`, `delete`, `truncate` and `tables` on [`Database`]
//! - **Diagnostics** - last query, last error and the unlimited total of
//!   the last select
//! - **Introspection** - live columns and single-column indexes
//! - **Schema sync** - converging live tables to a declared
//!   [`TableSchema`](slate_sql_core::schema::TableSchema), with a
//!   force gate for destructive changes
//!
//! # Example
//!
//! ```rust,ignore
//! use slate_db::prelude::*;
//!
//! let mut db = Database::<MySqlBackend>::from_env();
//! let schema = load_schema("schema.json")?;
//! for change in db.update_schema(&schema, SyncOptions::new()).await? {
//!     println!("{change}");
//! }
//!
//! let id = db.insert("users", Values::new().set("name", "Ada")).await?;
//! let user = db.get("users", &["id", "name"], &Where::new().eq("id", id.as_str())).await?;
//! ```

pub mod backend;
pub mod config;
pub mod connection;
pub mod crud;
pub mod error;
pub mod introspect;
pub mod record;
pub mod sync;

pub use backend::{Backend, MySqlBackend, SqliteBackend};
pub use config::DbConfig;
pub use connection::Database;
pub use error::{DbError, Result};
pub use introspect::LiveColumn;
pub use record::Record;
pub use sync::{load_schema, SyncOptions};

/// Commonly used types.
pub mod prelude {
    pub use crate::backend::{Backend, MySqlBackend, SqliteBackend};
    pub use crate::config::DbConfig;
    pub use crate::connection::Database;
    pub use crate::error::{DbError, Result};
    pub use crate::record::Record;
    pub use crate::sync::{load_schema, SyncOptions};
    pub use slate_sql_core::change::ChangeRecord;
    pub use slate_sql_core::clause::{Direction, Join, Limit, Where};
    pub use slate_sql_core::query::QuerySpec;
    pub use slate_sql_core::schema::TableSchema;
    pub use slate_sql_core::value::{Scalar, Values};
}
