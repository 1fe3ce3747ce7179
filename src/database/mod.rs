//! Database connection abstraction
//!
//! The ingestion engine only needs a handle that can run SQL with
//! positional parameters. This module defines that [`Connection`]
//! capability, the shared error and result types, and result formatting
//! for the CLI.
//!
//! - DuckDB: embedded database, file-based or in-memory (`duckdb-backend`)

use serde::{Deserialize, Serialize};

use tracing::warn;

use crate::models::Value;

#[cfg(feature = "duckdb-backend")]
pub mod duckdb;

pub mod config;

#[cfg(feature = "duckdb-backend")]
pub use self::duckdb::DuckDbConnection;

pub use config::RunConfig;

/// Error type for database operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Statement or query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),
}

/// Result type for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Query result row as a JSON value
pub type QueryRow = serde_json::Value;

/// Query result set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column names
    pub columns: Vec<String>,
    /// Rows of data
    pub rows: Vec<QueryRow>,
    /// Number of rows affected (for INSERT/UPDATE/DELETE)
    pub rows_affected: Option<u64>,
    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl QueryResult {
    /// Create a new query result
    pub fn new(columns: Vec<String>, rows: Vec<QueryRow>) -> Self {
        Self {
            columns,
            rows,
            rows_affected: None,
            execution_time_ms: 0,
        }
    }

    /// Create an empty result
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First column of the first row, if any
    pub fn scalar(&self) -> Option<&serde_json::Value> {
        let column = self.columns.first()?;
        self.rows.first()?.get(column)
    }
}

/// SQL-executing handle consumed by the ingestion engine
///
/// Parameters bind to positional `?` placeholders in order. Implementations
/// are used by a single caller at a time; sharing one underlying database
/// between callers is the caller's concern.
pub trait Connection {
    /// Execute a statement, returning the number of rows changed
    fn execute(&self, sql: &str, params: &[Value]) -> DatabaseResult<usize>;

    /// Execute a query and collect its rows
    fn query(&self, sql: &str, params: &[Value]) -> DatabaseResult<QueryResult>;

    /// Close the connection, reporting any failure to release it
    fn close(self) -> DatabaseResult<()>
    where
        Self: Sized;
}

/// Output format for query results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// ASCII table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Format query results for display
pub fn format_query_result(result: &QueryResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&result.rows).unwrap_or_else(|_| "[]".to_string())
        }
        OutputFormat::Csv => format_as_csv(result),
        OutputFormat::Table => format_as_table(result),
    }
}

fn cell_text(row: &QueryRow, column: &str, null: &str) -> String {
    match row.get(column).unwrap_or(&serde_json::Value::Null) {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => null.to_string(),
        other => other.to_string(),
    }
}

fn format_as_csv(result: &QueryResult) -> String {
    match write_csv(result) {
        Ok(output) => output,
        Err(e) => {
            warn!("Failed to format result as CSV: {}", e);
            String::new()
        }
    }
}

fn write_csv(result: &QueryResult) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(&result.columns)?;
    for row in &result.rows {
        writer.write_record(result.columns.iter().map(|col| cell_text(row, col, "")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn format_as_table(result: &QueryResult) -> String {
    if result.is_empty() {
        return "(0 rows)".to_string();
    }

    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| {
            result
                .columns
                .iter()
                .map(|col| cell_text(row, col, "null"))
                .collect()
        })
        .collect();

    // Calculate column widths
    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.len()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let pad = |values: &[String]| -> String {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| format!("{:width$}", v, width = widths[i]))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    let mut output = String::new();
    output.push_str(&pad(&result.columns));
    output.push('\n');

    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    output.push_str(&separator.join("-+-"));
    output.push('\n');

    for row in &cells {
        output.push_str(&pad(row));
        output.push('\n');
    }

    output.push_str(&format!("({} rows)", result.row_count()));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(
            OutputFormat::from_str("table").unwrap(),
            OutputFormat::Table
        );
        assert_eq!(OutputFormat::from_str("json").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("csv").unwrap(), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert!(OutputFormat::from_str("unknown").is_err());
    }

    #[test]
    fn test_query_result_empty() {
        let result = QueryResult::empty();
        assert!(result.is_empty());
        assert_eq!(result.row_count(), 0);
        assert!(result.scalar().is_none());
    }

    #[test]
    fn test_scalar() {
        let result = QueryResult::new(
            vec!["count_star()".to_string()],
            vec![serde_json::json!({"count_star()": 3})],
        );
        assert_eq!(result.scalar(), Some(&serde_json::json!(3)));
    }

    #[test]
    fn test_format_as_table() {
        let result = QueryResult::new(
            vec!["id".to_string(), "label".to_string()],
            vec![
                serde_json::json!({"id": 1, "label": "ok"}),
                serde_json::json!({"id": 2, "label": null}),
            ],
        );

        let output = format_as_table(&result);
        assert!(output.contains("id"));
        assert!(output.contains("label"));
        assert!(output.contains("null"));
        assert!(output.contains("(2 rows)"));
    }

    #[test]
    fn test_format_as_csv() {
        let result = QueryResult::new(
            vec!["name".to_string(), "description".to_string()],
            vec![
                serde_json::json!({"name": "test", "description": "simple"}),
                serde_json::json!({"name": "complex", "description": "has, comma"}),
            ],
        );

        let output = format_as_csv(&result);
        assert!(output.contains("name,description"));
        assert!(output.contains("test,simple"));
        assert!(output.contains("\"has, comma\""));
    }

    #[test]
    fn test_write_csv_is_complete() {
        let result = QueryResult::new(
            vec!["id".to_string(), "note".to_string()],
            vec![
                serde_json::json!({"id": 1, "note": "say \"hi\""}),
                serde_json::json!({"id": 2, "note": null}),
            ],
        );

        let output = write_csv(&result).unwrap();
        assert_eq!(output, "id,note\n1,\"say \"\"hi\"\"\"\n2,\n");
        assert_eq!(format_as_csv(&result), output);
    }
}
