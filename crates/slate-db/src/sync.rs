//! Declarative schema synchronization.
//!
//! Each declared table is brought to its declared end state with the
//! fewest changes: create the table if missing, drop columns that are no
//! longer declared, add or redefine declared columns in declaration
//! order, then reconcile each column's index. Changes that can lose data
//! (drops, redefinitions, index drops) only run with
//! [`SyncOptions::force`]; without it they are reported as skipped.
//!
//! A second forced run against an unchanged declaration yields no
//! changes.

use std::collections::HashSet;
use std::path::Path;

use slate_sql_core::change::{ChangeRecord, Outcome, SchemaChange, SkipReason};
use slate_sql_core::dialect::Dialect;
use slate_sql_core::sanitize::sanitize_identifier;
use slate_sql_core::schema::{is_reserved, ColumnSpec, IndexKind, TableDef, TableSchema};
use tracing::{info, warn};

use crate::backend::Backend;
use crate::connection::Database;
use crate::error::Result;
use crate::introspect::LiveColumn;

/// Options for a synchronization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Apply destructive changes.
    pub force: bool,
    /// Compute and render the changes without executing them.
    pub dry_run: bool,
}

impl SyncOptions {
    /// Non-destructive, executing run.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether destructive changes are applied.
    #[must_use]
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Sets dry-run mode.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Loads a JSON schema description from a file.
///
/// # Errors
///
/// [`DbError::Io`](crate::DbError::Io) if the file cannot be read,
/// [`DbError::Json`](crate::DbError::Json) if it is not JSON, and a
/// build error if the description is malformed.
pub fn load_schema(path: impl AsRef<Path>) -> Result<TableSchema> {
    let source = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&source)?;
    Ok(TableSchema::from_json(&value)?)
}

impl<B: Backend> Database<B> {
    /// Brings every declared table to its declared state and returns the
    /// change log in execution order.
    ///
    /// # Errors
    ///
    /// The first failing statement aborts the run with
    /// [`DbError::Statement`](crate::DbError::Statement); changes applied
    /// before it stay applied.
    pub async fn update_schema(
        &mut self,
        schema: &TableSchema,
        options: SyncOptions,
    ) -> Result<Vec<ChangeRecord>> {
        let mut log = Vec::new();
        let mut existing = self.tables().await?;
        for table in schema.tables() {
            self.sync_table(table, &mut existing, options, &mut log)
                .await?;
        }
        info!(
            changes = log.len(),
            skipped = log.iter().filter(|r| r.is_skipped()).count(),
            dry_run = options.dry_run,
            "schema sync finished"
        );
        Ok(log)
    }

    async fn sync_table(
        &mut self,
        table: &TableDef,
        existing: &mut Vec<String>,
        options: SyncOptions,
        log: &mut Vec<ChangeRecord>,
    ) -> Result<()> {
        let dialect = B::dialect();
        let name = table.name.as_str();

        let missing = !existing.iter().any(|t| t == name);
        if missing {
            let change = SchemaChange::CreateTable {
                table: name.to_string(),
            };
            self.apply(change, options, log).await?;
            existing.push(name.to_string());
        }
        let mut live = if missing && options.dry_run {
            Vec::new()
        } else {
            self.user_columns(name).await?
        };

        // drop pass
        let declared: HashSet<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        let stale: Vec<LiveColumn> = live
            .iter()
            .filter(|c| !declared.contains(c.name()))
            .cloned()
            .collect();
        for column in stale {
            // live names are engine-reported and may not be identifiers
            let change = SchemaChange::DropColumn {
                table: name.to_string(),
                column: sanitize_identifier(column.name())?,
                index: column
                    .index_name
                    .as_deref()
                    .map(sanitize_identifier)
                    .transpose()?,
            };
            if self.apply(change, options, log).await? {
                live.retain(|c| c.name() != column.name());
            }
        }

        // add/modify pass
        let mut after = String::from("id");
        for column in &table.columns {
            if is_reserved(&column.name) {
                warn!(table = name, column = %column.name, "reserved column declared, ignoring");
                continue;
            }

            match live.iter().position(|c| c.name() == column.name) {
                None => {
                    let change = SchemaChange::AddColumn {
                        table: name.to_string(),
                        column: column.clone(),
                        after: after.clone(),
                    };
                    self.apply(change, options, log).await?;
                    let position = live
                        .iter()
                        .position(|c| c.name() == after)
                        .map_or(0, |p| p + 1);
                    live.insert(
                        position,
                        LiveColumn {
                            spec: column.clone(),
                            index_name: column
                                .index
                                .is_indexed()
                                .then(|| dialect.index_name(name, &column.name)),
                        },
                    );
                }
                Some(i) => {
                    if column.definition_differs(&live[i].spec) {
                        self.modify_column(name, column, i, &mut live, options, log)
                            .await?;
                    }
                    self.sync_index(name, column, &mut live, options, log)
                        .await?;
                }
            }
            after.clone_from(&column.name);
        }
        Ok(())
    }

    async fn modify_column(
        &mut self,
        table: &str,
        declared: &ColumnSpec,
        position: usize,
        live: &mut Vec<LiveColumn>,
        options: SyncOptions,
        log: &mut Vec<ChangeRecord>,
    ) -> Result<()> {
        // the index is reconciled separately
        let mut column = declared.clone();
        column.index = live[position].spec.index;

        let mut table_columns: Vec<ColumnSpec> = live.iter().map(|c| c.spec.clone()).collect();
        table_columns[position] = column.clone();

        let change = SchemaChange::ModifyColumn {
            table: table.to_string(),
            column: column.clone(),
            table_columns,
        };
        if !self.apply(change, options, log).await? {
            return Ok(());
        }
        if options.dry_run {
            live[position].spec = column;
        } else {
            // engines that rebuild the table also rename its indexes
            *live = self.user_columns(table).await?;
        }
        Ok(())
    }

    async fn sync_index(
        &mut self,
        table: &str,
        declared: &ColumnSpec,
        live: &mut [LiveColumn],
        options: SyncOptions,
        log: &mut Vec<ChangeRecord>,
    ) -> Result<()> {
        let dialect = B::dialect();
        let Some(current) = live.iter_mut().find(|c| c.name() == declared.name) else {
            return Ok(());
        };
        if current.spec.index == declared.index {
            return Ok(());
        }

        let mut drop_skipped = false;
        if current.spec.index.is_indexed() {
            let change = SchemaChange::DropIndex {
                table: table.to_string(),
                column: declared.name.clone(),
                name: current
                    .index_name
                    .clone()
                    .unwrap_or_else(|| dialect.index_name(table, &declared.name)),
            };
            if self.apply(change, options, log).await? {
                current.spec.index = IndexKind::None;
                current.index_name = None;
            } else {
                drop_skipped = true;
            }
        }

        if declared.index.is_indexed() {
            let change = SchemaChange::AddIndex {
                table: table.to_string(),
                column: declared.name.clone(),
                kind: declared.index,
            };
            if drop_skipped {
                skip(change, SkipReason::PendingIndexDrop, dialect, log);
            } else {
                self.apply(change, options, log).await?;
                current.spec.index = declared.index;
                current.index_name = Some(dialect.index_name(table, &declared.name));
            }
        }
        Ok(())
    }

    /// Executes a change, or records it as planned or skipped. Returns
    /// `false` when the change was skipped.
    async fn apply(
        &mut self,
        change: SchemaChange,
        options: SyncOptions,
        log: &mut Vec<ChangeRecord>,
    ) -> Result<bool> {
        let dialect = B::dialect();
        if change.is_destructive() && !options.force {
            warn!(change = %change, "destructive change skipped, use force to apply");
            skip(change, SkipReason::Destructive, dialect, log);
            return Ok(false);
        }

        let sql = dialect.change_sql(&change);
        if options.dry_run {
            info!(change = %change, "planned");
            log.push(ChangeRecord {
                change,
                outcome: Outcome::Planned,
                sql,
            });
            return Ok(true);
        }

        for statement in &sql {
            self.execute(statement).await?;
        }
        info!(change = %change, "applied");
        log.push(ChangeRecord {
            change,
            outcome: Outcome::Applied,
            sql,
        });
        Ok(true)
    }
}

fn skip(
    change: SchemaChange,
    reason: SkipReason,
    dialect: &dyn Dialect,
    log: &mut Vec<ChangeRecord>,
) {
    let sql = dialect.change_sql(&change);
    log.push(ChangeRecord {
        change,
        outcome: Outcome::Skipped(reason),
        sql,
    });
}
