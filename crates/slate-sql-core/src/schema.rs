//! Column and table schema descriptions.
//!
//! A [`ColumnSpec`] describes one column, either read from a live table
//! or declared as the desired end state. A [`TableSchema`] is the ordered
//! set of declared tables loaded from a schema description such as:
//!
//! ```json
//! {
//!   "users": {
//!     "name":  { "type": "VARCHAR(64)", "null": false, "default": "" },
//!     "email": { "type": "VARCHAR(255)", "index": "unique" },
//!     "age":   { "type": "INT", "default": 0, "index": true }
//!   }
//! }
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{BuildError, Result};
use crate::sanitize::sanitize_identifier;
use crate::value::{json_kind, Scalar};

/// Columns every managed table owns. They are created with the table and
/// never dropped, modified or treated as declared columns.
pub const RESERVED_COLUMNS: [&str; 3] = ["id", "created_at", "updated_at"];

/// Engine type used when a declaration omits `type` or says `string`.
pub const DEFAULT_ENGINE_TYPE: &str = "VARCHAR(128)";

/// Length reported for unbounded `TEXT` columns.
pub const TEXT_LENGTH: u32 = 60_000;

/// Length reported for `VARCHAR` without an explicit size.
pub const VARCHAR_DEFAULT_LENGTH: u32 = 255;

static VARCHAR_LENGTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)varchar\(([0-9]*)\)").expect("varchar pattern is valid")
});

/// Returns `true` for `id`, `created_at` and `updated_at`.
#[must_use]
pub fn is_reserved(column: &str) -> bool {
    RESERVED_COLUMNS.contains(&column)
}

/// Coarse value type derived from an engine type string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    /// Integer and boolean types.
    Int,
    /// Float types.
    Float,
    /// Everything else.
    String,
}

impl SemanticType {
    /// Classifies an engine type string by substring match and extracts
    /// the declared length of bounded string types.
    ///
    /// `int`/`bool` map to [`SemanticType::Int`], `float` to
    /// [`SemanticType::Float`], anything else to [`SemanticType::String`].
    /// `VARCHAR(n)` yields `n`, bare `TEXT` yields [`TEXT_LENGTH`].
    #[must_use]
    pub fn classify(engine_type: &str) -> (Self, Option<u32>) {
        let lower = engine_type.trim().to_ascii_lowercase();
        if lower.contains("int") || lower.contains("bool") {
            return (Self::Int, None);
        }
        if lower.contains("float") {
            return (Self::Float, None);
        }
        let length = if let Some(caps) = VARCHAR_LENGTH.captures(&lower) {
            Some(caps[1].parse().unwrap_or(VARCHAR_DEFAULT_LENGTH))
        } else if lower == "text" {
            Some(TEXT_LENGTH)
        } else {
            None
        };
        (Self::String, length)
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
        })
    }
}

/// Index attached to a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// No index.
    #[default]
    None,
    /// Plain (non-unique) index.
    NonUnique,
    /// Unique index.
    Unique,
}

impl IndexKind {
    /// Returns `true` unless this is [`IndexKind::None`].
    #[must_use]
    pub const fn is_indexed(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Reads a declaration: `"unique"` (any case) is unique, any other
    /// truthy value is a plain index, absent or falsy is none.
    #[must_use]
    pub fn from_declaration(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("unique") => Self::Unique,
            Some(v) if truthy(v) => Self::NonUnique,
            _ => Self::None,
        }
    }
}

/// One column definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSpec {
    /// Sanitized column name.
    pub name: String,
    /// Engine type as written, e.g. `VARCHAR(64)`.
    pub engine_type: String,
    /// Classification of `engine_type`.
    pub semantic_type: SemanticType,
    /// Declared length for bounded string types.
    pub length: Option<u32>,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Default value; `None` means no default.
    pub default: Option<Scalar>,
    /// Index on this column.
    pub index: IndexKind,
}

impl ColumnSpec {
    /// Creates a nullable, unindexed column without default.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::EmptyIdentifier`] if `name` sanitizes to
    /// nothing.
    pub fn new(name: &str, engine_type: &str) -> Result<Self> {
        let name = sanitize_identifier(name)?;
        let engine_type = engine_type.trim();
        let engine_type = if engine_type.is_empty() || engine_type.eq_ignore_ascii_case("string") {
            DEFAULT_ENGINE_TYPE
        } else {
            engine_type
        };
        let (semantic_type, length) = SemanticType::classify(engine_type);
        Ok(Self {
            name,
            engine_type: engine_type.to_string(),
            semantic_type,
            length,
            nullable: true,
            default: None,
            index: IndexKind::None,
        })
    }

    /// Sets nullability.
    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Scalar>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the index kind.
    #[must_use]
    pub fn index(mut self, index: IndexKind) -> Self {
        self.index = index;
        self
    }

    /// Reads one column declaration:
    /// `{type, default, null, index}`, every key optional.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidSchema`] for non-object declarations,
    /// non-string types and unusable names.
    pub fn from_declaration(name: &str, declaration: &Value) -> Result<Self> {
        let fields = match declaration {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other => {
                return Err(BuildError::InvalidSchema(format!(
                    "column '{name}' must be an object, got {}",
                    json_kind(other)
                )));
            }
        };

        let engine_type = match fields.get("type") {
            None | Some(Value::Null) => DEFAULT_ENGINE_TYPE,
            Some(Value::String(s)) => s.as_str(),
            Some(other) => {
                return Err(BuildError::InvalidSchema(format!(
                    "column '{name}': type must be a string, got {}",
                    json_kind(other)
                )));
            }
        };

        let default = match fields.get("default") {
            Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("NULL") => None,
            Some(Value::String(s)) => Some(Scalar::Text(s.trim().to_string())),
            Some(v @ Value::Number(_)) => Some(Scalar::from_json(v)?),
            _ => None,
        };

        let nullable = match fields.get("null") {
            Some(value) => truthy(value),
            None => true,
        };
        let index = IndexKind::from_declaration(fields.get("index"));

        let mut column = Self::new(name, engine_type)
            .map_err(|e| BuildError::InvalidSchema(format!("column '{name}': {e}")))?
            .nullable(nullable)
            .index(index);
        column.default = default;
        Ok(column)
    }

    /// Compares engine type (case-insensitive, integer display width
    /// ignored), nullability and default
    /// with another definition of the same column. Index kind is not
    /// part of this comparison.
    #[must_use]
    pub fn definition_differs(&self, other: &ColumnSpec) -> bool {
        normalized_type(&self.engine_type) != normalized_type(&other.engine_type)
            || self.nullable != other.nullable
            || normalized_default(self.default.as_ref()) != normalized_default(other.default.as_ref())
    }

    /// Short `TYPE NULL|NOT NULL` summary used in change descriptions.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} {}",
            self.engine_type,
            if self.nullable { "NULL" } else { "NOT NULL" }
        );
        if let Some(default) = &self.default {
            summary.push_str(&format!(" DEFAULT {default}"));
        }
        summary
    }
}

/// Lowercased engine type; integer display widths such as `int(11)`
/// are dropped.
fn normalized_type(engine_type: &str) -> String {
    let lower = engine_type.trim().to_ascii_lowercase();
    if !lower.contains("int") {
        return lower;
    }
    match (lower.find('('), lower.find(')')) {
        (Some(open), Some(close)) if open < close => {
            format!("{}{}", &lower[..open], &lower[close + 1..])
                .trim()
                .to_string()
        }
        _ => lower,
    }
}

/// Normalized textual form of a default used for comparisons: trimmed,
/// lowercased, `NOW()` folded into `current_timestamp`, SQL `NULL`
/// folded into "no default".
#[must_use]
pub fn normalized_default(value: Option<&Scalar>) -> Option<String> {
    let text = match value? {
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Text(s) => {
            let lower = s.trim().to_ascii_lowercase();
            // numeric text compares by value so "1.50" matches 1.5
            match lower.parse::<f64>() {
                Ok(f) if f.is_finite() && !lower.is_empty() => f.to_string(),
                _ => lower,
            }
        }
    };
    match text.as_str() {
        "null" => None,
        "now()" | "current_timestamp()" => Some(String::from("current_timestamp")),
        _ => Some(text),
    }
}

/// A declared table: its name and its user columns in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDef {
    /// Sanitized table name.
    pub name: String,
    /// Declared columns in declaration order.
    pub columns: Vec<ColumnSpec>,
}

impl TableDef {
    /// Looks up a declared column.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Ordered table declarations.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableSchema {
    tables: Vec<TableDef>,
}

impl TableSchema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a table, builder style.
    #[must_use]
    pub fn table(mut self, name: &str, columns: Vec<ColumnSpec>) -> Self {
        self.tables.push(TableDef {
            name: name.to_string(),
            columns,
        });
        self
    }

    /// Tables in declaration order.
    #[must_use]
    pub fn tables(&self) -> &[TableDef] {
        &self.tables
    }

    /// Looks up a table by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Returns `true` if no table is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Parses a JSON schema description, keeping declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidSchema`] if `source` is not JSON or not
    /// a valid description.
    pub fn from_json_str(source: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(source)
            .map_err(|e| BuildError::InvalidSchema(format!("not valid JSON: {e}")))?;
        Self::from_json(&value)
    }

    /// Builds a schema from an already parsed JSON description.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidSchema`] if the top level is not a non-
    /// empty object of non-empty tables.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Object(tables) = value else {
            return Err(BuildError::InvalidSchema(format!(
                "expected an object of tables, got {}",
                json_kind(value)
            )));
        };
        if tables.is_empty() {
            return Err(BuildError::InvalidSchema(String::from("no tables declared")));
        }

        let mut schema = Self::new();
        for (table, columns) in tables {
            let name = sanitize_identifier(table)
                .map_err(|_| BuildError::InvalidSchema(format!("invalid table name '{table}'")))?;
            let columns = match columns {
                Value::Object(map) if !map.is_empty() => map,
                _ => {
                    return Err(BuildError::InvalidSchema(format!(
                        "table '{table}' must declare at least one column"
                    )));
                }
            };
            let columns = columns
                .iter()
                .map(|(column, declaration)| ColumnSpec::from_declaration(column, declaration))
                .collect::<Result<Vec<_>>>()?;
            schema.tables.push(TableDef { name, columns });
        }
        Ok(schema)
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
