//! Identifier whitelisting and literal escaping.
//!
//! Every identifier and value that ends up in a statement passes through
//! this module. Identifiers are reduced to `[A-Za-z0-9_.]`; values are
//! quoted and escaped by the target dialect.

use crate::dialect::Dialect;
use crate::error::{BuildError, Result};
use crate::value::Scalar;

/// Literal strings passed through unescaped so callers can force SQL
/// `NOW()` and `NULL` semantics.
pub const SENTINELS: [&str; 2] = ["NOW()", "NULL"];

/// Strips every character outside `[A-Za-z0-9_.]`.
///
/// # Errors
///
/// Returns [`BuildError::EmptyIdentifier`] when nothing is left.
pub fn sanitize_identifier(raw: &str) -> Result<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return Err(BuildError::EmptyIdentifier(raw.to_string()));
    }
    Ok(cleaned)
}

/// Renders a scalar as a SQL literal.
///
/// In LIKE mode the escaped value is wrapped in `'%...%'`. Otherwise the
/// sentinels `NOW()` and `NULL` pass through verbatim, numbers are
/// unquoted and text is quoted and escaped.
#[must_use]
pub fn sanitize_value(value: &Scalar, like: bool, dialect: &dyn Dialect) -> String {
    if like {
        return format!("'%{}%'", dialect.escape_str(&value.to_string()));
    }
    match value {
        Scalar::Text(s) if SENTINELS.contains(&s.as_str()) => s.clone(),
        Scalar::Text(s) => format!("'{}'", dialect.escape_str(s)),
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) if f.is_finite() => f.to_string(),
        Scalar::Float(_) => String::from("NULL"),
    }
}
