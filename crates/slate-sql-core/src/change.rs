//! Schema changes produced by diffing a declared schema against a live one.

use std::fmt;

use serde::Serialize;

use crate::schema::{ColumnSpec, IndexKind};

/// One structural change to a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum SchemaChange {
    /// Create a table holding only the reserved columns.
    CreateTable {
        /// Table name.
        table: String,
    },
    /// Add a column after `after`, with its index when declared.
    AddColumn {
        /// Table name.
        table: String,
        /// Column to add.
        column: ColumnSpec,
        /// Existing column the new one is positioned after.
        after: String,
    },
    /// Redefine an existing column.
    ModifyColumn {
        /// Table name.
        table: String,
        /// New definition.
        column: ColumnSpec,
        /// Every user column of the table once the change is applied, in
        /// table order. Engines that rebuild the table to change a column
        /// need the full layout.
        table_columns: Vec<ColumnSpec>,
    },
    /// Drop a column, together with its index when it has one.
    DropColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// Name of the index on that column, if any.
        index: Option<String>,
    },
    /// Add an index on a single column.
    AddIndex {
        /// Table name.
        table: String,
        /// Indexed column.
        column: String,
        /// Unique or plain.
        kind: IndexKind,
    },
    /// Drop the index on a single column.
    DropIndex {
        /// Table name.
        table: String,
        /// Indexed column.
        column: String,
        /// Index name as reported by the engine.
        name: String,
    },
}

impl SchemaChange {
    /// Table the change applies to.
    #[must_use]
    pub fn table(&self) -> &str {
        match self {
            Self::CreateTable { table }
            | Self::AddColumn { table, .. }
            | Self::ModifyColumn { table, .. }
            | Self::DropColumn { table, .. }
            | Self::AddIndex { table, .. }
            | Self::DropIndex { table, .. } => table,
        }
    }

    /// Whether applying the change can lose data or break existing
    /// readers. Destructive changes only run with `force`.
    #[must_use]
    pub const fn is_destructive(&self) -> bool {
        matches!(
            self,
            Self::ModifyColumn { .. } | Self::DropColumn { .. } | Self::DropIndex { .. }
        )
    }
}

impl fmt::Display for SchemaChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateTable { table } => write!(f, "created table `{table}`"),
            Self::AddColumn { table, column, .. } => {
                write!(f, "added column `{table}.{}` {}", column.name, column.summary())?;
                match column.index {
                    IndexKind::None => Ok(()),
                    IndexKind::NonUnique => f.write_str(" with index"),
                    IndexKind::Unique => f.write_str(" with unique index"),
                }
            }
            Self::ModifyColumn { table, column, .. } => write!(
                f,
                "modified column `{table}.{}` to {}",
                column.name,
                column.summary()
            ),
            Self::DropColumn { table, column, .. } => {
                write!(f, "dropped column `{table}.{column}`")
            }
            Self::AddIndex {
                table,
                column,
                kind,
            } => match kind {
                IndexKind::Unique => write!(f, "added unique index on `{table}.{column}`"),
                _ => write!(f, "added index on `{table}.{column}`"),
            },
            Self::DropIndex { table, name, .. } => {
                write!(f, "dropped index `{name}` on `{table}`")
            }
        }
    }
}

/// Why a change was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Destructive and `force` was not set.
    Destructive,
    /// An index replacement whose preceding drop was skipped.
    PendingIndexDrop,
}

/// What happened to a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    /// Executed against the database.
    Applied,
    /// Would have been executed; dry run.
    Planned,
    /// Not executed.
    Skipped(SkipReason),
}

/// Entry of the change log returned by a sync run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeRecord {
    /// The change.
    #[serde(flatten)]
    pub change: SchemaChange,
    /// What happened to it.
    #[serde(flatten)]
    pub outcome: Outcome,
    /// Statements issued, or that would have been issued.
    pub sql: Vec<String>,
}

impl ChangeRecord {
    /// Returns `true` if the change was executed.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        self.outcome == Outcome::Applied
    }

    /// Returns `true` if the change was skipped.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, Outcome::Skipped(_))
    }
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            Outcome::Applied => write!(f, "{}", self.change),
            Outcome::Planned => write!(f, "[planned] {}", self.change),
            Outcome::Skipped(SkipReason::Destructive) => {
                write!(f, "[skipped, needs --force] {}", self.change)
            }
            Outcome::Skipped(SkipReason::PendingIndexDrop) => {
                write!(f, "[skipped, old index kept] {}", self.change)
            }
        }
    }
}
