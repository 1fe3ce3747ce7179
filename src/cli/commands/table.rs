//! Table commands: create a table from its definition, ingest a data file

use std::path::{Path, PathBuf};

use crate::cli::error::CliError;
use crate::database::config::load_table_definition;
use crate::database::{Connection, DuckDbConnection, RunConfig};
use crate::ingest::{IngestionEngine, InsertMode};
use crate::models::{SchemaCatalog, TableDefinition};
use crate::source;

/// Create command arguments
#[derive(Debug, Clone)]
pub struct CreateArgs {
    /// Table definition file
    pub table: PathBuf,
    /// Database name, when the definition does not carry one
    pub database: Option<String>,
    /// Directory holding database files
    pub db_dir: PathBuf,
}

/// Ingest command arguments
#[derive(Debug, Clone)]
pub struct IngestArgs {
    /// Table definition file
    pub table: PathBuf,
    /// Data file (JSON, JSONL, CSV or Parquet)
    pub input: PathBuf,
    /// Database name, when the definition does not carry one
    pub database: Option<String>,
    /// Directory holding database files
    pub db_dir: PathBuf,
    /// Insert mode ("per-row" or "bulk")
    pub mode: String,
}

fn load_definition(path: &Path) -> Result<TableDefinition, CliError> {
    if !path.exists() {
        return Err(CliError::FileNotFound(path.to_path_buf()));
    }
    load_table_definition(path).map_err(|e| CliError::FileReadError(path.to_path_buf(), e.to_string()))
}

fn open_database(
    definition: &TableDefinition,
    database: Option<String>,
    db_dir: PathBuf,
) -> Result<DuckDbConnection, CliError> {
    let config = RunConfig {
        database,
        db_dir,
        ..Default::default()
    };
    let name = config.database_name(Some(definition)).ok_or_else(|| {
        CliError::InvalidArgument(
            "No database given: pass --database or set 'database' in the table definition"
                .to_string(),
        )
    })?;
    Ok(DuckDbConnection::open_named(&config.db_dir, &name)?)
}

/// Create the table described by a definition file
pub fn handle_create(args: &CreateArgs) -> Result<(), CliError> {
    let definition = load_definition(&args.table)?;
    let catalog = SchemaCatalog::from_definition(&definition)?;
    let conn = open_database(&definition, args.database.clone(), args.db_dir.clone())?;

    IngestionEngine::new(&catalog)
        .try_create_table(&conn)
        .map_err(|e| CliError::CreateFailed(catalog.table_name().to_string(), e.to_string()))?;
    conn.close()?;

    println!("Table {} created", catalog.table_name());
    Ok(())
}

/// Create the table if needed and ingest a data file into it
pub fn handle_ingest(args: &IngestArgs) -> Result<(), CliError> {
    let mode: InsertMode = args
        .mode
        .parse()
        .map_err(|e: String| CliError::InvalidArgument(e))?;

    if !args.input.exists() {
        return Err(CliError::FileNotFound(args.input.clone()));
    }

    let definition = load_definition(&args.table)?;
    let catalog = SchemaCatalog::from_definition(&definition)?;
    let conn = open_database(&definition, args.database.clone(), args.db_dir.clone())?;

    let engine = IngestionEngine::new(&catalog).with_mode(mode);
    engine.create_table(&conn);

    let records = source::load_records(&conn, &args.input)
        .map_err(|e| CliError::FileReadError(args.input.clone(), e.to_string()))?;
    let outcome = engine.ingest(&conn, &records)?;
    conn.close()?;

    println!("{}", outcome);
    Ok(())
}
