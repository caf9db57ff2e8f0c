//! # slate-sql-core
//!
//! Text SQL building and declarative schema diffing primitives.
//!
//! This crate has no database dependency. It provides:
//! - An identifier whitelist and dialect-aware literal escaping
//! - Clause builders for select lists, nested WHERE groups with
//!   operator suffixes in keys, inner joins, grouping, ordering and limits
//! - Whole-statement builders for select, count, sum, insert, update,
//!   delete and truncate
//! - Column and table schema descriptions loaded from JSON
//! - Schema changes and their per-engine DDL (MySQL, SQLite)
//!
//! Statements are built as plain text, never with bound parameters, so
//! every identifier and literal passes through [`sanitize`].
//!
//! ```rust
//! use slate_sql_core::clause::{Direction, Limit, Where};
//! use slate_sql_core::dialect::MySqlDialect;
//! use slate_sql_core::query::QuerySpec;
//!
//! let sql = QuerySpec::new("users")
//!     .columns(["id", "name"])
//!     .filter(Where::new().eq("name", "'; DROP TABLE users; --"))
//!     .order_by("name", Direction::Asc)
//!     .limit(Limit::Count(10))
//!     .select_sql(&MySqlDialect)
//!     .unwrap();
//!
//! assert_eq!(
//!     sql,
//!     "SELECT id, name FROM users WHERE name = '\\'; DROP TABLE users; --' \
//!      ORDER BY name ASC LIMIT 10"
//! );
//! ```

pub mod change;
pub mod clause;
pub mod dialect;
pub mod error;
pub mod query;
pub mod sanitize;
pub mod schema;
pub mod value;

pub use change::{ChangeRecord, Outcome, SchemaChange, SkipReason};
pub use clause::{Direction, Join, Limit, Where};
pub use dialect::{Dialect, MySqlDialect, SqliteDialect};
pub use error::{BuildError, Result};
pub use query::QuerySpec;
pub use sanitize::{sanitize_identifier, sanitize_value};
pub use schema::{ColumnSpec, IndexKind, SemanticType, TableDef, TableSchema};
pub use value::{Scalar, Values};
