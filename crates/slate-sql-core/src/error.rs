//! Error types for SQL building and schema descriptions.

/// Errors raised while turning structured input into SQL.
///
/// Every variant is raised before any statement reaches the database.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// An identifier was empty once every disallowed character was stripped.
    #[error("identifier '{0}' is empty after sanitization")]
    EmptyIdentifier(String),

    /// A value had a shape the builders refuse to render (boolean, null,
    /// nested structure, misplaced group, ...).
    #[error("invalid value: {0}")]
    ValueShape(String),

    /// The declarative schema description is malformed.
    #[error("invalid schema description: {0}")]
    InvalidSchema(String),
}

/// Result type for SQL building.
pub type Result<T> = std::result::Result<T, BuildError>;
