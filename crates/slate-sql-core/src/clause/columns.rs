//! Column list builder.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;
use crate::sanitize::sanitize_identifier;

static AGGREGATE_ALIAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(SUM|COUNT|MAX|MIN)\(\s*(\*|[a-z0-9_.]+)\s*\)\s+AS\s+([a-z0-9_]+)\s*$")
        .expect("aggregate alias pattern is valid")
});

static COLUMN_ALIAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*([a-z0-9_.]+)\s+AS\s+([a-z0-9_.]+)\s*$")
        .expect("column alias pattern is valid")
});

/// Renders a select list.
///
/// `*` passes through, `FUNC(col) AS alias` (FUNC in SUM/COUNT/MAX/MIN)
/// and `col AS alias` keep their shape with sanitized identifiers and a
/// quoted alias, anything else is sanitized as a bare identifier. An
/// empty list selects `*`.
///
/// # Errors
///
/// Returns [`BuildError::EmptyIdentifier`](crate::error::BuildError) if a
/// column sanitizes to nothing.
pub fn columns<S: AsRef<str>>(columns: &[S]) -> Result<String> {
    if columns.is_empty() {
        return Ok(String::from("*"));
    }

    let mut rendered = Vec::with_capacity(columns.len());
    for column in columns {
        let column = column.as_ref();
        if column.trim() == "*" {
            rendered.push(String::from("*"));
        } else if let Some(caps) = AGGREGATE_ALIAS.captures(column) {
            let argument = match &caps[2] {
                "*" => String::from("*"),
                col => sanitize_identifier(col)?,
            };
            rendered.push(format!(
                "{}({}) AS '{}'",
                caps[1].to_ascii_uppercase(),
                argument,
                sanitize_identifier(&caps[3])?
            ));
        } else if let Some(caps) = COLUMN_ALIAS.captures(column) {
            rendered.push(format!(
                "{} AS '{}'",
                sanitize_identifier(&caps[1])?,
                sanitize_identifier(&caps[2])?
            ));
        } else {
            rendered.push(sanitize_identifier(column)?);
        }
    }
    Ok(rendered.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildError;

    #[test]
    fn test_star_and_empty() {
        assert_eq!(columns::<&str>(&[]).unwrap(), "*");
        assert_eq!(columns(&["*"]).unwrap(), "*");
    }

    #[test]
    fn test_plain_columns_are_sanitized() {
        assert_eq!(
            columns(&["id", "users.name", "bad-col"]).unwrap(),
            "id, users.name, badcol"
        );
    }

    #[test]
    fn test_aggregate_alias() {
        assert_eq!(
            columns(&["sum(amount) as total"]).unwrap(),
            "SUM(amount) AS 'total'"
        );
        assert_eq!(
            columns(&["COUNT(*) AS rows"]).unwrap(),
            "COUNT(*) AS 'rows'"
        );
    }

    #[test]
    fn test_column_alias() {
        assert_eq!(
            columns(&["u.name AS author", "*"]).unwrap(),
            "u.name AS 'author', *"
        );
    }

    #[test]
    fn test_empty_identifier_fails() {
        assert!(matches!(
            columns(&["()"]),
            Err(BuildError::EmptyIdentifier(_))
        ));
    }
}
