//! Column model and semantic type tags

use serde::{Deserialize, Serialize};

/// Semantic type of a column, derived from its declared SQL type
///
/// Only the first four tags are checked during coercion. Anything the
/// mapping does not recognise is carried as `Other` with the raw type
/// string and passed through unchecked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Integer,
    Float,
    Text,
    Boolean,
    Other(String),
}

const FLOAT_PREFIXES: &[&str] = &["FLOAT", "DOUBLE", "DECIMAL", "NUMERIC"];
const TEXT_PREFIXES: &[&str] = &["VARCHAR", "CHAR", "TEXT"];
const BOOLEAN_PREFIXES: &[&str] = &["BOOL"];

impl TypeTag {
    /// Map a declared SQL type string to a type tag
    ///
    /// Matching is a case-insensitive prefix test, so `INTEGER`, `int8` and
    /// `INT` all map to [`TypeTag::Integer`] and `DECIMAL(10,2)` maps to
    /// [`TypeTag::Float`].
    pub fn from_sql_type(sql_type: &str) -> Self {
        let upper = sql_type.trim_start().to_uppercase();
        let has_prefix = |prefixes: &[&str]| prefixes.iter().any(|p| upper.starts_with(p));

        if upper.starts_with("INT") {
            TypeTag::Integer
        } else if has_prefix(FLOAT_PREFIXES) {
            TypeTag::Float
        } else if has_prefix(TEXT_PREFIXES) {
            TypeTag::Text
        } else if has_prefix(BOOLEAN_PREFIXES) {
            TypeTag::Boolean
        } else {
            TypeTag::Other(sql_type.to_string())
        }
    }

    /// Whether values for this tag are type-checked during coercion
    pub fn is_checked(&self) -> bool {
        !matches!(self, TypeTag::Other(_))
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeTag::Integer => write!(f, "integer"),
            TypeTag::Float => write!(f, "float"),
            TypeTag::Text => write!(f, "text"),
            TypeTag::Boolean => write!(f, "boolean"),
            TypeTag::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// A declared table column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    /// Column name
    pub name: String,
    /// SQL type exactly as declared (emitted verbatim in CREATE TABLE)
    pub declared_type: String,
    /// Semantic tag derived from `declared_type`
    pub type_tag: TypeTag,
}

impl Column {
    /// Create a new column, deriving its type tag from the declared type
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        let declared_type = declared_type.into();
        Self {
            name: name.into(),
            type_tag: TypeTag::from_sql_type(&declared_type),
            declared_type,
        }
    }
}

impl<N: Into<String>, T: Into<String>> From<(N, T)> for Column {
    fn from((name, declared_type): (N, T)) -> Self {
        Column::new(name, declared_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tag_mapping() {
        assert_eq!(TypeTag::from_sql_type("INTEGER"), TypeTag::Integer);
        assert_eq!(TypeTag::from_sql_type("int8"), TypeTag::Integer);
        assert_eq!(TypeTag::from_sql_type("DOUBLE"), TypeTag::Float);
        assert_eq!(TypeTag::from_sql_type("decimal(10,2)"), TypeTag::Float);
        assert_eq!(TypeTag::from_sql_type("NUMERIC"), TypeTag::Float);
        assert_eq!(TypeTag::from_sql_type("float4"), TypeTag::Float);
        assert_eq!(TypeTag::from_sql_type("VARCHAR(255)"), TypeTag::Text);
        assert_eq!(TypeTag::from_sql_type("char"), TypeTag::Text);
        assert_eq!(TypeTag::from_sql_type("Text"), TypeTag::Text);
        assert_eq!(TypeTag::from_sql_type("BOOLEAN"), TypeTag::Boolean);
        assert_eq!(TypeTag::from_sql_type("bool"), TypeTag::Boolean);
    }

    #[test]
    fn test_unrecognised_types_are_other() {
        assert_eq!(
            TypeTag::from_sql_type("TIMESTAMP"),
            TypeTag::Other("TIMESTAMP".to_string())
        );
        assert_eq!(
            TypeTag::from_sql_type("date"),
            TypeTag::Other("date".to_string())
        );
        // BIGINT does not start with INT
        assert_eq!(
            TypeTag::from_sql_type("BIGINT"),
            TypeTag::Other("BIGINT".to_string())
        );
        assert!(!TypeTag::from_sql_type("UUID").is_checked());
    }

    #[test]
    fn test_column_from_tuple() {
        let column: Column = ("id", "INTEGER").into();
        assert_eq!(column.name, "id");
        assert_eq!(column.declared_type, "INTEGER");
        assert_eq!(column.type_tag, TypeTag::Integer);
    }
}
