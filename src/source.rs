//! Record sources
//!
//! Turns data files into flat [`Record`]s before they reach the engine.
//! JSON and CSV are parsed in-process; Parquet is read through the
//! connection so the embedded engine does the decoding.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::database::{Connection, DatabaseError};
use crate::models::{Record, Value, record_from_json};

/// Errors raised while reading records
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON in {path} (record {record}): {error}")]
    JsonParse {
        path: PathBuf,
        record: usize,
        error: String,
    },

    #[error("Failed to parse CSV in {path}: {error}")]
    CsvParse { path: PathBuf, error: String },

    #[error("Record {record} in {path} is not an object")]
    InvalidRecord { path: PathBuf, record: usize },

    #[error("Unsupported file format: {0}")]
    Unsupported(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Data file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    JsonLines,
    Csv,
    Parquet,
}

/// What a path to execute contains
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// Records to ingest
    Data(DataFormat),
    /// SQL text
    Sql,
    /// Anything else, including scripts, which are never executed
    Unsupported(String),
}

impl SourceKind {
    /// Classify a path by its extension
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "json" => SourceKind::Data(DataFormat::Json),
            "jsonl" | "ndjson" => SourceKind::Data(DataFormat::JsonLines),
            "csv" => SourceKind::Data(DataFormat::Csv),
            "parquet" => SourceKind::Data(DataFormat::Parquet),
            "sql" => SourceKind::Sql,
            _ => SourceKind::Unsupported(format!(".{}", extension)),
        }
    }
}

/// Read a JSON file holding an array of objects or a single object
pub fn read_json(path: &Path) -> Result<Vec<Record>, SourceError> {
    let content = fs::read_to_string(path)?;
    let document: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| SourceError::JsonParse {
            path: path.to_path_buf(),
            record: 0,
            error: e.to_string(),
        })?;

    let items = match document {
        serde_json::Value::Array(items) => items,
        other => vec![other],
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            record_from_json(item).ok_or_else(|| SourceError::InvalidRecord {
                path: path.to_path_buf(),
                record: index,
            })
        })
        .collect()
}

/// Read a newline-delimited JSON file, one object per line
pub fn read_json_lines(path: &Path) -> Result<Vec<Record>, SourceError> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();

        // Skip empty lines
        if trimmed.is_empty() {
            continue;
        }

        let value: serde_json::Value =
            serde_json::from_str(trimmed).map_err(|e| SourceError::JsonParse {
                path: path.to_path_buf(),
                record: index,
                error: e.to_string(),
            })?;
        let record = record_from_json(value).ok_or_else(|| SourceError::InvalidRecord {
            path: path.to_path_buf(),
            record: index,
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Read a CSV file with a header row
///
/// Each column gets one type for the whole file: integer, then float, then
/// `true`/`false`, falling back to text as soon as the cells disagree. Empty
/// cells are null and do not take part in the choice.
pub fn read_csv(path: &Path) -> Result<Vec<Record>, SourceError> {
    let csv_error = |e: csv::Error| SourceError::CsvParse {
        path: path.to_path_buf(),
        error: e.to_string(),
    };

    let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
    let headers = reader.headers().map_err(csv_error)?.clone();
    let rows = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(csv_error)?;

    let kinds: Vec<CellKind> = (0..headers.len())
        .map(|i| CellKind::for_column(rows.iter().filter_map(|row| row.get(i))))
        .collect();

    Ok(rows
        .iter()
        .map(|row| {
            headers
                .iter()
                .zip(row.iter())
                .zip(&kinds)
                .map(|((header, cell), kind)| (header.to_string(), kind.parse(cell)))
                .collect()
        })
        .collect())
}

/// Type shared by every non-empty cell of a CSV column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Integer,
    Float,
    Boolean,
    Text,
}

impl CellKind {
    fn for_column<'a>(cells: impl Iterator<Item = &'a str>) -> Self {
        let mut kind: Option<CellKind> = None;

        for cell in cells.map(str::trim).filter(|c| !c.is_empty()) {
            let widened = match (kind, Self::of(cell)) {
                (None, k) => k,
                (Some(a), b) if a == b => a,
                (Some(CellKind::Integer), CellKind::Float)
                | (Some(CellKind::Float), CellKind::Integer) => CellKind::Float,
                _ => CellKind::Text,
            };
            if widened == CellKind::Text {
                return CellKind::Text;
            }
            kind = Some(widened);
        }

        kind.unwrap_or(CellKind::Text)
    }

    fn of(cell: &str) -> Self {
        if cell.parse::<i64>().is_ok() {
            CellKind::Integer
        } else if cell.parse::<f64>().is_ok_and(f64::is_finite) {
            CellKind::Float
        } else if cell.eq_ignore_ascii_case("true") || cell.eq_ignore_ascii_case("false") {
            CellKind::Boolean
        } else {
            CellKind::Text
        }
    }

    fn parse(self, cell: &str) -> Value {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }

        let parsed = match self {
            CellKind::Integer => trimmed.parse().ok().map(Value::Integer),
            CellKind::Float => trimmed.parse().ok().map(Value::Float),
            CellKind::Boolean => Some(Value::Boolean(trimmed.eq_ignore_ascii_case("true"))),
            CellKind::Text => None,
        };
        parsed.unwrap_or_else(|| Value::Text(cell.to_string()))
    }
}

/// Read a Parquet file through the connection
pub fn read_parquet<C: Connection + ?Sized>(
    conn: &C,
    path: &Path,
) -> Result<Vec<Record>, SourceError> {
    let sql = format!(
        "SELECT * FROM read_parquet('{}')",
        path.display().to_string().replace('\'', "''")
    );
    let result = conn.query(&sql, &[])?;

    Ok(result
        .rows
        .into_iter()
        .filter_map(record_from_json)
        .collect())
}

/// Load every record from a data file
pub fn load_records<C: Connection + ?Sized>(
    conn: &C,
    path: &Path,
) -> Result<Vec<Record>, SourceError> {
    let records = match SourceKind::from_path(path) {
        SourceKind::Data(DataFormat::Json) => read_json(path)?,
        SourceKind::Data(DataFormat::JsonLines) => read_json_lines(path)?,
        SourceKind::Data(DataFormat::Csv) => read_csv(path)?,
        SourceKind::Data(DataFormat::Parquet) => read_parquet(conn, path)?,
        SourceKind::Sql => return Err(SourceError::Unsupported(".sql".to_string())),
        SourceKind::Unsupported(ext) => return Err(SourceError::Unsupported(ext)),
    };

    info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}
