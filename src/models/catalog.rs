//! Table catalog: the immutable description of an ingestion target

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::column::Column;
use crate::ingest::IngestError;

/// How a value that does not match its column's declared type is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Discard the whole row
    #[default]
    Skip,
    /// Store NULL for the offending column
    Null,
    /// Abort the batch with a type mismatch
    Error,
    /// Try to convert the value, storing NULL when conversion fails
    Convert,
}

impl std::str::FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(ErrorPolicy::Skip),
            "null" => Ok(ErrorPolicy::Null),
            "error" => Ok(ErrorPolicy::Error),
            "convert" => Ok(ErrorPolicy::Convert),
            _ => Err(format!(
                "error_behavior must be 'skip', 'null', 'error', or 'convert' (got '{}')",
                s
            )),
        }
    }
}

impl std::fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorPolicy::Skip => write!(f, "skip"),
            ErrorPolicy::Null => write!(f, "null"),
            ErrorPolicy::Error => write!(f, "error"),
            ErrorPolicy::Convert => write!(f, "convert"),
        }
    }
}

/// External table definition, as read from a configuration file
///
/// ```yaml
/// database: analytics
/// name: customers
/// schema_definition:
///   - [customer_id, INTEGER]
///   - [name, VARCHAR]
/// primary_key: customer_id
/// error_behavior: convert
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Table name
    pub name: String,
    /// Ordered `[column_name, sql_type]` pairs
    #[serde(default)]
    pub schema_definition: Vec<(String, String)>,
    /// Primary key column
    #[serde(default)]
    pub primary_key: Option<String>,
    /// One of `skip`, `null`, `error`, `convert`
    #[serde(default = "default_error_behavior")]
    pub error_behavior: String,
    /// Database the table lives in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

fn default_error_behavior() -> String {
    ErrorPolicy::default().to_string()
}

/// Immutable description of a typed table
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    table_name: String,
    columns: Vec<Column>,
    primary_key: Option<String>,
    error_policy: ErrorPolicy,
}

impl SchemaCatalog {
    /// Build a catalog, validating it up front
    ///
    /// Fails with [`IngestError::InvalidSchema`] when the table name is empty,
    /// no columns are declared, a column name repeats, or the primary key is
    /// not one of the declared columns.
    pub fn new(
        table_name: impl Into<String>,
        columns: Vec<Column>,
        primary_key: Option<String>,
        error_policy: ErrorPolicy,
    ) -> Result<Self, IngestError> {
        let table_name = table_name.into();

        if table_name.trim().is_empty() {
            return Err(IngestError::InvalidSchema(
                "table name must not be empty".to_string(),
            ));
        }
        if columns.is_empty() {
            return Err(IngestError::InvalidSchema(format!(
                "table '{}' declares no columns",
                table_name
            )));
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(IngestError::InvalidSchema(format!(
                    "column '{}' is declared more than once in table '{}'",
                    column.name, table_name
                )));
            }
        }

        if let Some(pk) = &primary_key
            && !seen.contains(pk.as_str())
        {
            return Err(IngestError::InvalidSchema(format!(
                "Primary key '{}' must be a column in the schema",
                pk
            )));
        }

        Ok(Self {
            table_name,
            columns,
            primary_key,
            error_policy,
        })
    }

    /// Build a catalog from an external definition
    ///
    /// The error behavior string is validated here, so an unknown policy is
    /// reported as [`IngestError::InvalidSchema`] like any other defect.
    pub fn from_definition(definition: &TableDefinition) -> Result<Self, IngestError> {
        let error_policy: ErrorPolicy = definition
            .error_behavior
            .parse()
            .map_err(IngestError::InvalidSchema)?;

        let columns = definition
            .schema_definition
            .iter()
            .map(|(name, sql_type)| Column::new(name.as_str(), sql_type.as_str()))
            .collect();

        Self::new(
            definition.name.clone(),
            columns,
            definition.primary_key.clone(),
            error_policy,
        )
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        self.error_policy
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this table
    pub fn create_statement(&self) -> String {
        let column_defs: Vec<String> = self
            .columns
            .iter()
            .map(|column| {
                let mut def = format!("{} {}", quote_ident(&column.name), column.declared_type);
                if self.primary_key.as_deref() == Some(column.name.as_str()) {
                    def.push_str(" PRIMARY KEY");
                }
                def
            })
            .collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            quote_ident(&self.table_name),
            column_defs.join(",\n    ")
        )
    }

    /// Quoted, comma separated column list in declaration order
    pub(crate) fn column_list(&self) -> String {
        self.column_names()
            .map(quote_ident)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Single-row parameterised INSERT covering every declared column
    pub fn insert_statement(&self) -> String {
        let placeholders = vec!["?"; self.columns.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&self.table_name),
            self.column_list(),
            placeholders
        )
    }
}

/// Double-quote an SQL identifier, escaping embedded quotes
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
