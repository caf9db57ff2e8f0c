//! Reading the live structure of tables.

use serde::Serialize;
use slate_sql_core::sanitize::sanitize_identifier;
use slate_sql_core::schema::{is_reserved, ColumnSpec, IndexKind, SemanticType};
use slate_sql_core::value::Scalar;

use crate::backend::Backend;
use crate::connection::Database;
use crate::error::Result;

/// A column as the engine reports it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveColumn {
    /// Definition read from the engine.
    #[serde(flatten)]
    pub spec: ColumnSpec,
    /// Name of the single-column index on this column, when known.
    pub index_name: Option<String>,
}

impl LiveColumn {
    /// Builds a live column, classifying the engine type.
    #[must_use]
    pub fn new(
        name: &str,
        engine_type: &str,
        nullable: bool,
        default: Option<Scalar>,
        index: IndexKind,
        index_name: Option<String>,
    ) -> Self {
        let (semantic_type, length) = SemanticType::classify(engine_type);
        Self {
            spec: ColumnSpec {
                name: name.to_string(),
                engine_type: engine_type.to_string(),
                semantic_type,
                length,
                nullable,
                default,
                index,
            },
            index_name,
        }
    }

    /// Column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.spec.name
    }
}

impl<B: Backend> Database<B> {
    /// Live columns of `table`, reserved columns included.
    ///
    /// # Errors
    ///
    /// Returns a build error for a blank table name, otherwise the errors
    /// of [`Database::query`].
    pub async fn describe(&mut self, table: &str) -> Result<Vec<LiveColumn>> {
        let table = sanitize_identifier(table)?;
        self.begin(&B::columns_sql(&table));
        let result = match self.connect().await {
            Ok(conn) => conn.describe(&table).await,
            Err(e) => Err(e),
        };
        self.settle(result)
    }

    /// Live columns of `table` that are not reserved.
    ///
    /// # Errors
    ///
    /// Same as [`Database::describe`].
    pub async fn user_columns(&mut self, table: &str) -> Result<Vec<LiveColumn>> {
        let mut columns = self.describe(table).await?;
        columns.retain(|c| !is_reserved(c.name()));
        Ok(columns)
    }

    /// Returns `true` if `table` exists in the current database.
    ///
    /// # Errors
    ///
    /// Same as [`Database::tables`].
    pub async fn table_exists(&mut self, table: &str) -> Result<bool> {
        let table = sanitize_identifier(table)?;
        Ok(self.tables().await?.contains(&table))
    }
}
