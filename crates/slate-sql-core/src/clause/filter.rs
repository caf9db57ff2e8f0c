//! WHERE clause builder.
//!
//! A [`Where`] is an ordered list of `(key, value)` entries mirroring the
//! map-shaped filters callers pass around:
//!
//! - a key of `AND` or `OR` holds a nested group joined by that conjunction;
//! - any other key is a column, optionally suffixed with an operator in
//!   brackets: `age[>]`, `age[>=]`, `age[<]`, `age[<=]`, `status[!]`
//!   (not equal) or `name[~]` (LIKE);
//! - a list value turns into an OR-group of comparisons against the same
//!   column and operator, which is how "one of N options" is expressed.
//!
//! The entries are first parsed into a [`WhereNode`] tree, then rendered.
//!
//! ```rust
//! use slate_sql_core::clause::Where;
//! use slate_sql_core::dialect::MySqlDialect;
//!
//! let filter = Where::new()
//!     .eq("age[>]", 18)
//!     .any_of("status", ["active", "pending"])
//!     .or(Where::new().eq("role", "admin").eq("name[~]", "ada"));
//!
//! assert_eq!(
//!     filter.to_sql(&MySqlDialect).unwrap(),
//!     " WHERE age > 18 AND ( status = 'active' OR status = 'pending' ) \
//!      AND ( role = 'admin' OR name LIKE '%ada%' )"
//! );
//! ```

use serde_json::Value;
use tracing::warn;

use crate::dialect::Dialect;
use crate::error::{BuildError, Result};
use crate::sanitize::{sanitize_identifier, sanitize_value};
use crate::value::{json_kind, Scalar};

/// How sibling conditions are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Conjunction {
    /// All conditions must hold.
    #[default]
    And,
    /// Any condition may hold.
    Or,
}

impl Conjunction {
    /// Parses a group key; only the exact strings `AND` and `OR` qualify.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            _ => None,
        }
    }

    /// SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Comparison operators reachable through the key suffix grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompareOp {
    /// `=` (no suffix)
    #[default]
    Eq,
    /// `!=` (`[!]`)
    Ne,
    /// `>` (`[>]`)
    Gt,
    /// `>=` (`[>=]`)
    Ge,
    /// `<` (`[<]`)
    Lt,
    /// `<=` (`[<=]`)
    Le,
    /// `LIKE` (`[~]`), value wrapped in `%...%`
    Like,
}

impl CompareOp {
    /// Parses the text between the brackets of a key suffix.
    #[must_use]
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "!" => Some(Self::Ne),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            "~" => Some(Self::Like),
            _ => None,
        }
    }

    /// SQL operator.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Like => "LIKE",
        }
    }

    /// Splits `column[op]` into the raw column part and the operator.
    ///
    /// Unrecognized suffixes fall back to `=` and are logged.
    #[must_use]
    pub fn split_key(key: &str) -> (&str, Self) {
        let key = key.trim();
        let Some(body) = key.strip_suffix(']') else {
            return (key, Self::Eq);
        };
        let Some(open) = body.rfind('[') else {
            return (key, Self::Eq);
        };
        let (column, suffix) = (&body[..open], &body[open + 1..]);
        match Self::from_suffix(suffix) {
            Some(op) => (column, op),
            None => {
                warn!(key = %key, suffix = %suffix, "unrecognized comparison suffix, using '='");
                (column, Self::Eq)
            }
        }
    }
}

/// The value side of a [`Where`] entry.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereValue {
    /// A single comparison.
    One(Scalar),
    /// One comparison per element, OR-ed together.
    AnyOf(Vec<Scalar>),
    /// A nested group; only valid under an `AND`/`OR` key.
    Group(Where),
}

impl From<Scalar> for WhereValue {
    fn from(value: Scalar) -> Self {
        Self::One(value)
    }
}

impl From<Vec<Scalar>> for WhereValue {
    fn from(values: Vec<Scalar>) -> Self {
        Self::AnyOf(values)
    }
}

impl From<Where> for WhereValue {
    fn from(group: Where) -> Self {
        Self::Group(group)
    }
}

/// Ordered filter entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Where {
    entries: Vec<(String, WhereValue)>,
}

impl Where {
    /// Creates an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a raw entry.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<WhereValue>) -> Self {
        self.push(key, value);
        self
    }

    /// Adds a raw entry in place.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<WhereValue>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Adds a single comparison; the key may carry an operator suffix.
    #[must_use]
    pub fn eq(self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.with(key, WhereValue::One(value.into()))
    }

    /// Adds an OR-group of comparisons against one column.
    #[must_use]
    pub fn any_of<I, V>(self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        self.with(
            key,
            WhereValue::AnyOf(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Adds a nested group joined with AND.
    #[must_use]
    pub fn and(self, group: Where) -> Self {
        self.with("AND", WhereValue::Group(group))
    }

    /// Adds a nested group joined with OR.
    #[must_use]
    pub fn or(self, group: Where) -> Self {
        self.with("OR", WhereValue::Group(group))
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the raw entries.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &WhereValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Builds a filter from a JSON object.
    ///
    /// Scalars become single comparisons, arrays of scalars become
    /// OR-groups, and objects are only accepted under `AND`/`OR` keys.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ValueShape`] if `value` is not an object or
    /// holds booleans, nulls or nested objects outside a group.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(BuildError::ValueShape(format!(
                "where must be an object, got {}",
                json_kind(value)
            )));
        };
        let mut filter = Self::new();
        for (key, inner) in map {
            let entry = match inner {
                Value::Object(_) => WhereValue::Group(Self::from_json(inner)?),
                Value::Array(items) => WhereValue::AnyOf(
                    items
                        .iter()
                        .map(Scalar::from_json)
                        .collect::<Result<Vec<_>>>()?,
                ),
                scalar => WhereValue::One(Scalar::from_json(scalar)?),
            };
            filter.push(key.as_str(), entry);
        }
        Ok(filter)
    }

    /// Parses the entries into a tree rooted at a group with the given
    /// conjunction.
    ///
    /// Column keys are sanitized here; shape errors surface before any SQL
    /// is rendered.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ValueShape`] for a group under a column key or
    /// a scalar under a group key, and [`BuildError::EmptyIdentifier`] for
    /// blank columns.
    pub fn to_tree(&self, conjunction: Conjunction) -> Result<WhereNode> {
        let mut children = Vec::with_capacity(self.entries.len());
        for (key, value) in &self.entries {
            if let Some(group_conjunction) = Conjunction::from_key(key) {
                let WhereValue::Group(group) = value else {
                    return Err(BuildError::ValueShape(format!(
                        "'{key}' must hold a nested group"
                    )));
                };
                children.push(group.to_tree(group_conjunction)?);
                continue;
            }

            let (raw_column, op) = CompareOp::split_key(key);
            let column = sanitize_identifier(raw_column)?;
            let operand = match value {
                WhereValue::One(v) => Operand::One(v.clone()),
                WhereValue::AnyOf(vs) => Operand::AnyOf(vs.clone()),
                WhereValue::Group(_) => {
                    return Err(BuildError::ValueShape(format!(
                        "column '{key}' cannot hold a nested group"
                    )));
                }
            };
            children.push(WhereNode::Condition {
                column,
                op,
                operand,
            });
        }
        Ok(WhereNode::Group {
            conjunction,
            children,
        })
    }

    /// Renders ` WHERE ...` joined with AND, or an empty string.
    ///
    /// # Errors
    ///
    /// Same as [`Where::to_tree`].
    pub fn to_sql(&self, dialect: &dyn Dialect) -> Result<String> {
        where_clause(self, Conjunction::And, true, dialect)
    }
}

/// Right-hand side of a parsed condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A single value.
    One(Scalar),
    /// Any of these values.
    AnyOf(Vec<Scalar>),
}

/// Parsed filter tree.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereNode {
    /// Children joined by a conjunction.
    Group {
        /// How the children are joined.
        conjunction: Conjunction,
        /// Nested nodes.
        children: Vec<WhereNode>,
    },
    /// One column comparison.
    Condition {
        /// Sanitized column name.
        column: String,
        /// Comparison operator.
        op: CompareOp,
        /// Value(s) to compare against.
        operand: Operand,
    },
}

impl WhereNode {
    /// Renders the node without any `WHERE` label.
    ///
    /// Nested groups and multi-value operands are wrapped in `( ... )`.
    /// Returns `None` for nodes that render to nothing (empty groups or
    /// empty value lists).
    #[must_use]
    pub fn render(&self, dialect: &dyn Dialect) -> Option<String> {
        match self {
            Self::Group {
                conjunction,
                children,
            } => {
                let parts: Vec<String> = children
                    .iter()
                    .filter_map(|child| match child {
                        Self::Group { .. } => child.render(dialect).map(|s| format!("( {s} )")),
                        Self::Condition { .. } => child.render(dialect),
                    })
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join(&format!(" {} ", conjunction.as_sql())))
                }
            }
            Self::Condition {
                column,
                op,
                operand,
            } => {
                let like = *op == CompareOp::Like;
                let compare =
                    |v: &Scalar| format!("{column} {} {}", op.as_sql(), sanitize_value(v, like, dialect));
                match operand {
                    Operand::One(v) => Some(compare(v)),
                    Operand::AnyOf(vs) if vs.is_empty() => None,
                    Operand::AnyOf(vs) => {
                        let ors: Vec<String> = vs.iter().map(compare).collect();
                        Some(format!("( {} )", ors.join(" OR ")))
                    }
                }
            }
        }
    }
}

/// Renders a filter.
///
/// Top-level conditions are joined with `conjunction`; with `label` the
/// result is prefixed with ` WHERE `. An empty filter renders as `""`.
///
/// # Errors
///
/// Same as [`Where::to_tree`].
pub fn where_clause(
    filter: &Where,
    conjunction: Conjunction,
    label: bool,
    dialect: &dyn Dialect,
) -> Result<String> {
    let tree = filter.to_tree(conjunction)?;
    Ok(match tree.render(dialect) {
        Some(body) if label => format!(" WHERE {body}"),
        Some(body) => body,
        None => String::new(),
    })
}
