//! Query and export commands
//!
//! Both work against an existing database file by name.

use std::path::{Path, PathBuf};

use crate::cli::error::CliError;
use crate::database::duckdb::resolve_database_path;
use crate::database::{Connection, DuckDbConnection, OutputFormat, format_query_result};

/// Query command arguments
#[derive(Debug, Clone)]
pub struct QueryArgs {
    /// SQL query to execute
    pub sql: String,
    /// Database name
    pub database: String,
    /// Directory holding database files
    pub db_dir: PathBuf,
    /// Output format
    pub format: String,
}

/// Export command arguments
#[derive(Debug, Clone)]
pub struct ExportArgs {
    /// Table to export
    pub table: String,
    /// Output Parquet file
    pub output: PathBuf,
    /// Database name
    pub database: String,
    /// Directory holding database files
    pub db_dir: PathBuf,
}

fn open_existing(db_dir: &Path, database: &str) -> Result<DuckDbConnection, CliError> {
    let path = resolve_database_path(db_dir, database);
    if !path.exists() {
        return Err(CliError::FileNotFound(path));
    }
    Ok(DuckDbConnection::open(path)?)
}

/// Execute a SQL query and print the result
pub fn handle_query(args: &QueryArgs) -> Result<(), CliError> {
    // Parse output format
    let output_format: OutputFormat = args
        .format
        .parse()
        .map_err(|e: String| CliError::InvalidArgument(e))?;

    let conn = open_existing(&args.db_dir, &args.database)?;
    let result = conn.query(&args.sql, &[])?;
    conn.close()?;

    println!("{}", format_query_result(&result, output_format));
    if output_format != OutputFormat::Json {
        eprintln!("\n{} row(s)", result.row_count());
    }
    Ok(())
}

/// Export a table to Parquet
pub fn handle_export(args: &ExportArgs) -> Result<(), CliError> {
    let conn = open_existing(&args.db_dir, &args.database)?;
    conn.export_parquet(&args.table, &args.output)?;
    conn.close()?;

    println!("Exported {} to {}", args.table, args.output.display());
    Ok(())
}
