//! The `run` command: one configured ingestion run

use std::path::PathBuf;

use crate::cli::error::CliError;
use crate::database::{OutputFormat, RunConfig, format_query_result};
use crate::pipeline::{self, RunReport};

/// Arguments for the `run` command
///
/// Unset fields fall back to the environment, see [`RunConfig::from_env`].
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    /// Table definition file
    pub table: Option<PathBuf>,
    /// Data or SQL file to execute
    pub execute: Option<PathBuf>,
    /// Database name
    pub database: Option<String>,
    /// Directory holding database files
    pub db_dir: Option<PathBuf>,
    /// Insert mode ("per-row" or "bulk")
    pub mode: Option<String>,
}

impl RunArgs {
    /// Layer the arguments over `config`
    fn apply_to(&self, mut config: RunConfig) -> Result<RunConfig, CliError> {
        if let Some(mode) = &self.mode {
            config.insert_mode = mode
                .parse()
                .map_err(|e: String| CliError::InvalidArgument(e))?;
        }
        if let Some(table) = &self.table {
            config.table = Some(table.clone());
        }
        if let Some(execute) = &self.execute {
            config.execute = Some(execute.clone());
        }
        if let Some(database) = &self.database {
            config.database = Some(database.clone());
        }
        if let Some(db_dir) = &self.db_dir {
            config.db_dir = db_dir.clone();
        }
        Ok(config)
    }
}

/// Handle the `run` command
pub fn handle_run(args: &RunArgs) -> Result<(), CliError> {
    let config = args.apply_to(RunConfig::from_env())?;

    if let Some(path) = &config.execute
        && !path.exists()
    {
        return Err(CliError::FileNotFound(path.clone()));
    }

    match pipeline::run(&config)? {
        RunReport::TableOnly { table_created } => {
            if !table_created {
                println!("Nothing to execute");
            }
        }
        RunReport::Ingested(outcome) => println!("{}", outcome),
        RunReport::Materialized { table, row_count } => {
            println!("Record Count {} ({})", row_count, table)
        }
        RunReport::Script(result) => {
            println!("{}", format_query_result(&result, OutputFormat::Table))
        }
    }

    Ok(())
}
