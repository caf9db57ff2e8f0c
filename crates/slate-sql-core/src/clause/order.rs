//! GROUP BY, ORDER BY and LIMIT builders.

use serde_json::Value;

use crate::error::{BuildError, Result};
use crate::sanitize::sanitize_identifier;
use crate::value::json_kind;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Desc,
}

impl Direction {
    /// Only the literal `ASC` sorts ascending; anything else is `DESC`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw == "ASC" {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    /// SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A LIMIT clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// `LIMIT count`
    Count(u64),
    /// `LIMIT offset, count`
    Range {
        /// Rows to skip.
        offset: u64,
        /// Rows to return.
        count: u64,
    },
}

impl Limit {
    /// Reads a bare integer or a one/two element array.
    ///
    /// `0`, `null` and `[]` mean "no limit".
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ValueShape`] for negative or non-numeric
    /// counts and arrays longer than two.
    pub fn from_json(value: &Value) -> Result<Option<Self>> {
        let as_u64 = |v: &Value| {
            v.as_u64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
                .ok_or_else(|| {
                    BuildError::ValueShape(format!(
                        "limit must be a non-negative integer, got {}",
                        json_kind(v)
                    ))
                })
        };
        match value {
            Value::Null => Ok(None),
            Value::Array(items) => match items.as_slice() {
                [] => Ok(None),
                [count] => Ok(Some(Self::Count(as_u64(count)?))),
                [offset, count] => Ok(Some(Self::Range {
                    offset: as_u64(offset)?,
                    count: as_u64(count)?,
                })),
                _ => Err(BuildError::ValueShape(String::from(
                    "limit takes at most two elements",
                ))),
            },
            other => match as_u64(other)? {
                0 => Ok(None),
                n => Ok(Some(Self::Count(n))),
            },
        }
    }
}

/// Renders ` GROUP BY a, b` or an empty string.
///
/// # Errors
///
/// Returns [`BuildError::EmptyIdentifier`] if a column sanitizes to
/// nothing.
pub fn group_clause<S: AsRef<str>>(group: &[S]) -> Result<String> {
    if group.is_empty() {
        return Ok(String::new());
    }
    let columns = group
        .iter()
        .map(|c| sanitize_identifier(c.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!(" GROUP BY {}", columns.join(", ")))
}

/// Renders ` ORDER BY a ASC, b DESC` or an empty string.
///
/// # Errors
///
/// Returns [`BuildError::EmptyIdentifier`] if a column sanitizes to
/// nothing.
pub fn order_clause(order: &[(String, Direction)]) -> Result<String> {
    if order.is_empty() {
        return Ok(String::new());
    }
    let parts = order
        .iter()
        .map(|(column, direction)| {
            Ok(format!(
                "{} {}",
                sanitize_identifier(column)?,
                direction.as_sql()
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(format!(" ORDER BY {}", parts.join(", ")))
}

/// Renders ` LIMIT a[, b]` or an empty string.
#[must_use]
pub fn limit_clause(limit: Option<Limit>) -> String {
    match limit {
        None => String::new(),
        Some(Limit::Count(count)) => format!(" LIMIT {count}"),
        Some(Limit::Range { offset, count }) => format!(" LIMIT {offset}, {count}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_group() {
        assert_eq!(group_clause::<&str>(&[]).unwrap(), "");
        assert_eq!(
            group_clause(&["status", "users.org"]).unwrap(),
            " GROUP BY status, users.org"
        );
    }

    #[test]
    fn test_order_defaults_to_desc() {
        let order = vec![
            ("name".to_string(), Direction::parse("ASC")),
            ("id".to_string(), Direction::parse("asc")),
            ("age".to_string(), Direction::parse("anything")),
        ];
        assert_eq!(
            order_clause(&order).unwrap(),
            " ORDER BY name ASC, id DESC, age DESC"
        );
        assert_eq!(order_clause(&[]).unwrap(), "");
    }

    #[test]
    fn test_limit_rendering() {
        assert_eq!(limit_clause(None), "");
        assert_eq!(limit_clause(Some(Limit::Count(10))), " LIMIT 10");
        assert_eq!(
            limit_clause(Some(Limit::Range {
                offset: 20,
                count: 10
            })),
            " LIMIT 20, 10"
        );
    }

    #[test]
    fn test_limit_from_json() {
        assert_eq!(Limit::from_json(&json!(5)).unwrap(), Some(Limit::Count(5)));
        assert_eq!(Limit::from_json(&json!(0)).unwrap(), None);
        assert_eq!(Limit::from_json(&json!([])).unwrap(), None);
        assert_eq!(Limit::from_json(&json!([3])).unwrap(), Some(Limit::Count(3)));
        assert_eq!(
            Limit::from_json(&json!([10, "5"])).unwrap(),
            Some(Limit::Range {
                offset: 10,
                count: 5
            })
        );
        assert!(Limit::from_json(&json!([1, 2, 3])).is_err());
        assert!(Limit::from_json(&json!(-1)).is_err());
    }
}
