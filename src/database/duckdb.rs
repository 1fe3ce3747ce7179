//! DuckDB connection implementation
//!
//! Provides the embedded analytical database the ingestion engine writes to.
//! Supports both file-based persistence and in-memory mode.

use std::path::{Path, PathBuf};

use duckdb::types::{TimeUnit, ToSql, ToSqlOutput, Value as DuckValue, ValueRef};
use tracing::{info, warn};

use super::{Connection, DatabaseError, DatabaseResult, QueryResult};
use crate::models::{Value, quote_ident};

/// File extension appended to bare database names
pub const DUCKDB_EXTENSION: &str = ".duckdb";

/// DuckDB connection
///
/// Owns a single DuckDB handle. The handle is not shared; callers that need
/// several writers must serialize access themselves.
pub struct DuckDbConnection {
    /// Path to the database file (None for in-memory)
    db_path: Option<PathBuf>,
    connection: duckdb::Connection,
}

impl DuckDbConnection {
    /// Open (or create) a file-based database
    pub fn open(db_path: impl AsRef<Path>) -> DatabaseResult<Self> {
        let path = db_path.as_ref().to_path_buf();
        let connection = duckdb::Connection::open(&path).map_err(|e| {
            DatabaseError::ConnectionFailed(format!("Failed to open DuckDB: {}", e))
        })?;

        Ok(Self {
            db_path: Some(path),
            connection,
        })
    }

    /// Create an in-memory database
    pub fn in_memory() -> DatabaseResult<Self> {
        let connection = duckdb::Connection::open_in_memory().map_err(|e| {
            DatabaseError::ConnectionFailed(format!("Failed to create in-memory DuckDB: {}", e))
        })?;

        Ok(Self {
            db_path: None,
            connection,
        })
    }

    /// Open a database by name inside a database directory
    ///
    /// The directory is created if missing; when that fails the current
    /// directory is used instead. `.duckdb` is appended to names that lack
    /// it.
    pub fn open_named(db_dir: impl AsRef<Path>, name: &str) -> DatabaseResult<Self> {
        let path = resolve_database_path(db_dir.as_ref(), name);
        let existed = path.exists();

        let conn = Self::open(&path)?;
        if existed {
            info!("Connected to existing database: {}", path.display());
        } else {
            info!("Created new database: {}", path.display());
        }
        Ok(conn)
    }

    /// Get the database file path (None for in-memory)
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Check if this is an in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.db_path.is_none()
    }

    /// Dump a table to a Parquet file
    pub fn export_parquet(&self, table: &str, output: impl AsRef<Path>) -> DatabaseResult<()> {
        let output = output.as_ref();
        let sql = format!(
            "COPY {} TO '{}' (FORMAT PARQUET)",
            quote_ident(table),
            output.display().to_string().replace('\'', "''")
        );
        self.execute(&sql, &[])?;
        info!("Exported {} to {}", table, output.display());
        Ok(())
    }

    /// Convert a DuckDB row to a JSON value
    fn row_to_json(row: &duckdb::Row, columns: &[String]) -> serde_json::Value {
        let mut map = serde_json::Map::new();

        for (i, col_name) in columns.iter().enumerate() {
            let value = match row.get_ref(i) {
                Ok(value_ref) => Self::value_ref_to_json(value_ref),
                Err(_) => serde_json::Value::Null,
            };
            map.insert(col_name.clone(), value);
        }

        serde_json::Value::Object(map)
    }

    /// Convert a DuckDB ValueRef to a JSON value
    fn value_ref_to_json(value: ValueRef) -> serde_json::Value {
        match value {
            ValueRef::Null => serde_json::Value::Null,
            ValueRef::Boolean(b) => serde_json::Value::Bool(b),
            ValueRef::TinyInt(i) => serde_json::Value::Number(i.into()),
            ValueRef::SmallInt(i) => serde_json::Value::Number(i.into()),
            ValueRef::Int(i) => serde_json::Value::Number(i.into()),
            ValueRef::BigInt(i) => serde_json::Value::Number(i.into()),
            // i128 may not fit in a JSON number
            ValueRef::HugeInt(i) => match i64::try_from(i) {
                Ok(small) => serde_json::Value::Number(small.into()),
                Err(_) => serde_json::Value::String(i.to_string()),
            },
            ValueRef::UTinyInt(i) => serde_json::Value::Number(i.into()),
            ValueRef::USmallInt(i) => serde_json::Value::Number(i.into()),
            ValueRef::UInt(i) => serde_json::Value::Number(i.into()),
            ValueRef::UBigInt(i) => serde_json::Value::Number(i.into()),
            ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ValueRef::Double(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned().into(),
            ValueRef::Blob(bytes) => {
                use base64::Engine;
                serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
            }
            ValueRef::Timestamp(unit, v) => chrono::DateTime::from_timestamp_micros(to_micros(unit, v))
                .map(|ts| serde_json::Value::String(ts.naive_utc().to_string()))
                .unwrap_or(serde_json::Value::Null),
            ValueRef::Date32(days) => chrono::DateTime::from_timestamp(i64::from(days) * 86_400, 0)
                .map(|ts| serde_json::Value::String(ts.date_naive().to_string()))
                .unwrap_or(serde_json::Value::Null),
            ValueRef::Time64(unit, v) => {
                let micros = to_micros(unit, v);
                chrono::NaiveTime::from_num_seconds_from_midnight_opt(
                    (micros / 1_000_000) as u32,
                    ((micros % 1_000_000) * 1_000) as u32,
                )
                .map(|t| serde_json::Value::String(t.to_string()))
                .unwrap_or(serde_json::Value::Null)
            }
            ValueRef::Decimal(d) => serde_json::Value::String(d.to_string()),
            #[allow(unreachable_patterns)]
            other => serde_json::Value::String(format!("{:?}", other)),
        }
    }
}

fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

/// Resolve `<db_dir>/<name>.duckdb`, creating `db_dir` when needed
pub fn resolve_database_path(db_dir: &Path, name: &str) -> PathBuf {
    let mut dir = db_dir.to_path_buf();
    if !dir.exists() {
        match std::fs::create_dir_all(&dir) {
            Ok(()) => info!("Created directory: {}", dir.display()),
            Err(e) => {
                warn!(
                    "Couldn't create directory {}, using current directory: {}",
                    dir.display(),
                    e
                );
                dir = PathBuf::from(".");
            }
        }
    }

    if name.ends_with(DUCKDB_EXTENSION) {
        dir.join(name)
    } else {
        dir.join(format!("{}{}", name, DUCKDB_EXTENSION))
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        let value = match self {
            Value::Null => DuckValue::Null,
            Value::Boolean(b) => DuckValue::Boolean(*b),
            Value::Integer(i) => DuckValue::BigInt(*i),
            Value::Float(f) => DuckValue::Double(*f),
            Value::Text(s) => DuckValue::Text(s.clone()),
            Value::Other(json) => DuckValue::Text(json.to_string()),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

impl Connection for DuckDbConnection {
    fn execute(&self, sql: &str, params: &[Value]) -> DatabaseResult<usize> {
        self.connection
            .execute(sql, duckdb::params_from_iter(params.iter()))
            .map_err(|e| DatabaseError::QueryFailed(format!("Execute failed: {}", e)))
    }

    fn query(&self, sql: &str, params: &[Value]) -> DatabaseResult<QueryResult> {
        let start = std::time::Instant::now();

        let mut stmt = self
            .connection
            .prepare(sql)
            .map_err(|e| DatabaseError::QueryFailed(format!("Prepare failed: {}", e)))?;

        // Columns are only known once the statement has executed
        let mut result_rows = stmt
            .query(duckdb::params_from_iter(params.iter()))
            .map_err(|e| DatabaseError::QueryFailed(format!("Query failed: {}", e)))?;

        let column_count = result_rows.as_ref().map(|r| r.column_count()).unwrap_or(0);
        let columns: Vec<String> = (0..column_count)
            .map(|i| {
                result_rows
                    .as_ref()
                    .and_then(|r| r.column_name(i).ok())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("col{}", i))
            })
            .collect();

        let mut rows = Vec::new();
        while let Some(row) = result_rows
            .next()
            .map_err(|e| DatabaseError::QueryFailed(format!("Row fetch error: {}", e)))?
        {
            rows.push(Self::row_to_json(row, &columns));
        }

        Ok(QueryResult {
            columns,
            rows,
            rows_affected: None,
            execution_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn close(self) -> DatabaseResult<()> {
        self.connection.close().map_err(|(_, e)| {
            DatabaseError::ConnectionFailed(format!("Failed to close DuckDB: {}", e))
        })?;
        info!("Connection closed");
        Ok(())
    }
}
