//! End-to-end ingestion run
//!
//! Opens the configured database, makes sure the target table exists and
//! then acts on the file to execute: data files are loaded and ingested,
//! SQL files either populate the table or run as a plain script.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::database::{Connection, DatabaseError, QueryResult, RunConfig};
use crate::ingest::{IngestError, IngestionEngine, InsertOutcome};
use crate::models::{SchemaCatalog, TableDefinition};
use crate::source::{self, SourceError, SourceKind};
use crate::sql;

/// Errors that end a run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No database configured: set DATABASE or add 'database' to the table definition")]
    MissingDatabase,

    #[error("{0} holds records but no table definition was given")]
    MissingTable(PathBuf),

    #[error("Unsupported file to execute: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// What a run did
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RunReport {
    /// Only the table was prepared; nothing was executed
    TableOnly { table_created: bool },
    /// Records were inserted
    Ingested(InsertOutcome),
    /// A query result replaced the configured table
    Materialized { table: String, row_count: u64 },
    /// A script ran without a table definition
    Script(QueryResult),
}

/// Run against an existing connection
///
/// Table creation failures are logged and do not stop the run; the
/// following insert reports them row by row.
pub fn run_with<C: Connection + ?Sized>(
    conn: &C,
    config: &RunConfig,
    definition: Option<&TableDefinition>,
) -> Result<RunReport, PipelineError> {
    let catalog = definition.map(SchemaCatalog::from_definition).transpose()?;

    let engine = catalog
        .as_ref()
        .map(|c| IngestionEngine::new(c).with_mode(config.insert_mode));
    let table_created = engine.is_some_and(|e| e.create_table(conn));
    if table_created {
        info!("Table created successfully!");
    }

    let Some(path) = config.execute.as_deref() else {
        return Ok(RunReport::TableOnly { table_created });
    };

    match SourceKind::from_path(path) {
        SourceKind::Data(_) => {
            let engine = engine.ok_or_else(|| PipelineError::MissingTable(path.to_path_buf()))?;
            let records = source::load_records(conn, path)?;
            if records.is_empty() {
                info!("No data to insert");
            }
            let outcome = engine.ingest(conn, &records)?;
            info!("{}", outcome);
            Ok(RunReport::Ingested(outcome))
        }
        SourceKind::Sql => {
            let script = std::fs::read_to_string(path).map_err(SourceError::from)?;
            match catalog.as_ref() {
                Some(catalog) => {
                    let row_count = sql::materialize(conn, catalog.table_name(), &script)?;
                    Ok(RunReport::Materialized {
                        table: catalog.table_name().to_string(),
                        row_count,
                    })
                }
                None => Ok(RunReport::Script(sql::run_script(conn, &script)?)),
            }
        }
        SourceKind::Unsupported(ext) => Err(PipelineError::Unsupported(format!(
            "{} ({})",
            path.display(),
            ext
        ))),
    }
}

/// Open the configured DuckDB database, run, and close it again
#[cfg(feature = "duckdb-backend")]
pub fn run(config: &RunConfig) -> Result<RunReport, PipelineError> {
    use crate::database::DuckDbConnection;

    let definition = config.table_definition()?;
    let name = config
        .database_name(definition.as_ref())
        .ok_or(PipelineError::MissingDatabase)?;

    let conn = DuckDbConnection::open_named(&config.db_dir, &name)?;
    let report = run_with(&conn, config, definition.as_ref());
    let closed = conn.close();

    let report = report?;
    closed?;
    Ok(report)
}
