//! Whole-statement builders for the CRUD surface.
//!
//! Every identifier goes through [`sanitize_identifier`] and every value
//! through [`sanitize_value`]; statements are plain text.

use crate::clause::{
    columns, group_clause, join_clause, limit_clause, order_clause, where_clause, Conjunction,
    Direction, Join, Limit, Where,
};
use crate::dialect::Dialect;
use crate::error::{BuildError, Result};
use crate::sanitize::{sanitize_identifier, sanitize_value};
use crate::value::Values;

/// Alias of the single column returned by aggregate statements.
pub const AGGREGATE_ALIAS: &str = "total";

/// Parts of a SELECT statement.
///
/// Without an explicit order the statement sorts by `id DESC`, newest
/// first.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    /// Table to read from.
    pub table: String,
    /// Select list; empty means `*`.
    pub columns: Vec<String>,
    /// Inner joins.
    pub joins: Vec<Join>,
    /// Row filter.
    pub filter: Where,
    /// GROUP BY columns.
    pub group_by: Vec<String>,
    /// ORDER BY terms; `None` means the default order.
    pub order_by: Option<Vec<(String, Direction)>>,
    /// LIMIT.
    pub limit: Option<Limit>,
}

impl QuerySpec {
    /// Starts a query on `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            joins: Vec::new(),
            filter: Where::new(),
            group_by: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    /// Sets the select list.
    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Adds an inner join.
    #[must_use]
    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Sets the row filter.
    #[must_use]
    pub fn filter(mut self, filter: Where) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the GROUP BY columns.
    #[must_use]
    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Appends an ORDER BY term, replacing the default order.
    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order_by
            .get_or_insert_with(Vec::new)
            .push((column.into(), direction));
        self
    }

    /// Drops the ORDER BY clause entirely.
    #[must_use]
    pub fn unordered(mut self) -> Self {
        self.order_by = Some(Vec::new());
        self
    }

    /// Sets the LIMIT.
    #[must_use]
    pub fn limit(mut self, limit: impl Into<Option<Limit>>) -> Self {
        self.limit = limit.into();
        self
    }

    fn default_order(&self) -> Vec<(String, Direction)> {
        // qualified once joined tables may also carry an id
        let column = if self.joins.is_empty() {
            String::from("id")
        } else {
            format!("{}.id", self.table)
        };
        vec![(column, Direction::Desc)]
    }

    /// Renders the SELECT statement.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] if any identifier sanitizes to nothing or
    /// the filter is malformed.
    pub fn select_sql(&self, dialect: &dyn Dialect) -> Result<String> {
        let table = sanitize_identifier(&self.table)?;
        let order = match &self.order_by {
            Some(order) => order_clause(order)?,
            None => order_clause(&self.default_order())?,
        };
        Ok(format!(
            "SELECT {} FROM {table}{}{}{}{order}{}",
            columns(&self.columns)?,
            join_clause(&self.joins)?,
            where_clause(&self.filter, Conjunction::And, true, dialect)?,
            group_clause(&self.group_by)?,
            limit_clause(self.limit),
        ))
    }

    /// Renders the unlimited row count matching this query: same joins,
    /// same filter, no grouping, ordering or limit.
    ///
    /// # Errors
    ///
    /// Same as [`QuerySpec::select_sql`].
    pub fn count_sql(&self, dialect: &dyn Dialect) -> Result<String> {
        Ok(format!(
            "SELECT COUNT(*) AS {AGGREGATE_ALIAS} FROM {}{}{}",
            sanitize_identifier(&self.table)?,
            join_clause(&self.joins)?,
            where_clause(&self.filter, Conjunction::And, true, dialect)?,
        ))
    }
}

/// `SELECT COUNT(*) AS total FROM table WHERE ...`.
///
/// # Errors
///
/// Same as [`QuerySpec::select_sql`].
pub fn count_sql(table: &str, filter: &Where, dialect: &dyn Dialect) -> Result<String> {
    QuerySpec::new(table)
        .filter(filter.clone())
        .count_sql(dialect)
}

/// `SELECT SUM(column) AS total FROM table WHERE ...`.
///
/// # Errors
///
/// Same as [`QuerySpec::select_sql`].
pub fn sum_sql(table: &str, column: &str, filter: &Where, dialect: &dyn Dialect) -> Result<String> {
    Ok(format!(
        "SELECT SUM({}) AS {AGGREGATE_ALIAS} FROM {}{}",
        sanitize_identifier(column)?,
        sanitize_identifier(table)?,
        where_clause(filter, Conjunction::And, true, dialect)?,
    ))
}

/// `INSERT INTO table (a, b) VALUES (x, y)`.
///
/// # Errors
///
/// Returns [`BuildError::ValueShape`] when `values` is empty.
pub fn insert_sql(table: &str, values: &Values, dialect: &dyn Dialect) -> Result<String> {
    if values.is_empty() {
        return Err(BuildError::ValueShape(String::from(
            "insert needs at least one value",
        )));
    }
    let mut names = Vec::with_capacity(values.len());
    let mut literals = Vec::with_capacity(values.len());
    for (column, value) in values.iter() {
        names.push(sanitize_identifier(column)?);
        literals.push(sanitize_value(value, false, dialect));
    }
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        sanitize_identifier(table)?,
        names.join(", "),
        literals.join(", ")
    ))
}

/// `UPDATE table SET a = x, b = y WHERE ...`.
///
/// # Errors
///
/// Returns [`BuildError::ValueShape`] when `values` is empty.
pub fn update_sql(
    table: &str,
    values: &Values,
    filter: &Where,
    dialect: &dyn Dialect,
) -> Result<String> {
    if values.is_empty() {
        return Err(BuildError::ValueShape(String::from(
            "update needs at least one value",
        )));
    }
    let assignments = values
        .iter()
        .map(|(column, value)| {
            Ok(format!(
                "{} = {}",
                sanitize_identifier(column)?,
                sanitize_value(value, false, dialect)
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(format!(
        "UPDATE {} SET {}{}",
        sanitize_identifier(table)?,
        assignments.join(", "),
        where_clause(filter, Conjunction::And, true, dialect)?,
    ))
}

/// `DELETE FROM table WHERE ...`.
///
/// # Errors
///
/// Same as [`QuerySpec::select_sql`].
pub fn delete_sql(table: &str, filter: &Where, dialect: &dyn Dialect) -> Result<String> {
    Ok(format!(
        "DELETE FROM {}{}",
        sanitize_identifier(table)?,
        where_clause(filter, Conjunction::And, true, dialect)?,
    ))
}

/// Dialect-specific statement emptying `table`.
///
/// # Errors
///
/// Returns [`BuildError::EmptyIdentifier`] for a blank table name.
pub fn truncate_sql(table: &str, dialect: &dyn Dialect) -> Result<String> {
    Ok(dialect.truncate_sql(&sanitize_identifier(table)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySqlDialect, SqliteDialect};

    #[test]
    fn test_select_defaults() {
        assert_eq!(
            QuerySpec::new("users").select_sql(&MySqlDialect).unwrap(),
            "SELECT * FROM users ORDER BY id DESC"
        );
    }

    #[test]
    fn test_select_full() {
        let query = QuerySpec::new("posts")
            .columns(["posts.title", "users.name AS author", "COUNT(*) AS n"])
            .join(Join::inner("users").on("users.id", "posts.user_id"))
            .filter(Where::new().eq("posts.status", "published"))
            .group_by(["posts.title", "users.name"])
            .order_by("posts.title", Direction::Asc)
            .limit(Limit::Range {
                offset: 20,
                count: 10,
            });
        assert_eq!(
            query.select_sql(&MySqlDialect).unwrap(),
            "SELECT posts.title, users.name AS 'author', COUNT(*) AS 'n' FROM posts \
             INNER JOIN users ON users.id=posts.user_id \
             WHERE posts.status = 'published' \
             GROUP BY posts.title, users.name ORDER BY posts.title ASC LIMIT 20, 10"
        );
        assert_eq!(
            query.count_sql(&MySqlDialect).unwrap(),
            "SELECT COUNT(*) AS total FROM posts \
             INNER JOIN users ON users.id=posts.user_id \
             WHERE posts.status = 'published'"
        );
    }

    #[test]
    fn test_default_order_is_qualified_with_joins() {
        let query = QuerySpec::new("posts").join(Join::inner("users").on("users.id", "posts.user_id"));
        assert!(query
            .select_sql(&MySqlDialect)
            .unwrap()
            .ends_with(" ORDER BY posts.id DESC"));
    }

    #[test]
    fn test_unordered_single_row() {
        let query = QuerySpec::new("users")
            .filter(Where::new().eq("id", "abc"))
            .unordered()
            .limit(Limit::Count(1));
        assert_eq!(
            query.select_sql(&SqliteDialect).unwrap(),
            "SELECT * FROM users WHERE id = 'abc' LIMIT 1"
        );
    }

    #[test]
    fn test_aggregates() {
        let filter = Where::new().eq("age[>=]", 18);
        assert_eq!(
            count_sql("users", &filter, &MySqlDialect).unwrap(),
            "SELECT COUNT(*) AS total FROM users WHERE age >= 18"
        );
        assert_eq!(
            sum_sql("orders", "amount", &Where::new(), &MySqlDialect).unwrap(),
            "SELECT SUM(amount) AS total FROM orders"
        );
    }

    #[test]
    fn test_insert_update_delete() {
        let values = Values::new()
            .set("id", "u1")
            .set("name", "O'Neil")
            .set("age", 40)
            .set("seen_at", "NOW()");
        assert_eq!(
            insert_sql("users", &values, &SqliteDialect).unwrap(),
            "INSERT INTO users (id, name, age, seen_at) VALUES ('u1', 'O''Neil', 40, NOW())"
        );
        assert_eq!(
            update_sql(
                "users",
                &Values::new().set("name", "Ada").set("deleted_at", "NULL"),
                &Where::new().eq("id", "u1"),
                &MySqlDialect
            )
            .unwrap(),
            "UPDATE users SET name = 'Ada', deleted_at = NULL WHERE id = 'u1'"
        );
        assert_eq!(
            delete_sql("users", &Where::new().eq("age[<]", 18), &MySqlDialect).unwrap(),
            "DELETE FROM users WHERE age < 18"
        );
        assert_eq!(
            truncate_sql("users", &MySqlDialect).unwrap(),
            "TRUNCATE TABLE users"
        );
    }

    #[test]
    fn test_empty_values_rejected() {
        assert!(matches!(
            insert_sql("users", &Values::new(), &MySqlDialect),
            Err(BuildError::ValueShape(_))
        ));
        assert!(matches!(
            update_sql("users", &Values::new(), &Where::new(), &MySqlDialect),
            Err(BuildError::ValueShape(_))
        ));
    }

    #[test]
    fn test_hostile_identifiers_are_stripped() {
        assert_eq!(
            delete_sql("users; DROP TABLE x", &Where::new(), &MySqlDialect).unwrap(),
            "DELETE FROM usersDROPTABLEx"
        );
        assert_eq!(
            count_sql("';--", &Where::new(), &MySqlDialect),
            Err(BuildError::EmptyIdentifier("';--".into()))
        );
    }
}
