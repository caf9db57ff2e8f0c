//! INNER JOIN builder.

use crate::error::Result;
use crate::sanitize::sanitize_identifier;

/// An inner join against `table` on `left=right` pairs joined with `AND`.
///
/// Left-hand sides are sanitized. Right-hand sides are rendered verbatim:
/// they are expected to be qualified column references such as
/// `users.id`, never user-supplied literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    /// Joined table.
    pub table: String,
    /// `(left, right)` equality pairs.
    pub on: Vec<(String, String)>,
}

impl Join {
    /// Creates a join with no conditions yet.
    #[must_use]
    pub fn inner(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            on: Vec::new(),
        }
    }

    /// Adds a `left=right` condition.
    #[must_use]
    pub fn on(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.on.push((left.into(), right.into()));
        self
    }
}

/// Renders ` INNER JOIN t ON a=b AND c=d ...` for every join that has at
/// least one condition.
///
/// # Errors
///
/// Returns [`BuildError::EmptyIdentifier`](crate::error::BuildError) if a
/// table or left-hand column sanitizes to nothing.
pub fn join_clause(joins: &[Join]) -> Result<String> {
    let mut rendered = Vec::new();
    for join in joins.iter().filter(|j| !j.on.is_empty()) {
        let table = sanitize_identifier(&join.table)?;
        let conditions = join
            .on
            .iter()
            .map(|(left, right)| Ok(format!("{}={}", sanitize_identifier(left)?, right)))
            .collect::<Result<Vec<_>>>()?;
        rendered.push(format!("INNER JOIN {table} ON {}", conditions.join(" AND ")));
    }
    if rendered.is_empty() {
        return Ok(String::new());
    }
    Ok(format!(" {}", rendered.join(" ")))
}
