//! CLI binary entry point for table-ingest

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use table_ingest::cli::commands::query::{ExportArgs, QueryArgs, handle_export, handle_query};
#[cfg(feature = "cli")]
use table_ingest::cli::commands::run::{RunArgs, handle_run};
#[cfg(feature = "cli")]
use table_ingest::cli::commands::table::{CreateArgs, IngestArgs, handle_create, handle_ingest};
#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "table-ingest")]
#[command(about = "Schema-typed ingestion into DuckDB")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Prepare a table and execute a data or SQL file against it
    Run {
        /// Table definition file (JSON, YAML or TOML) [env: TABLE]
        #[arg(short, long)]
        table: Option<PathBuf>,
        /// File to execute (JSON, JSONL, CSV, Parquet or SQL) [env: EXECUTE]
        #[arg(short, long)]
        execute: Option<PathBuf>,
        /// Database name, used when the table definition does not name one [env: DATABASE]
        #[arg(short, long)]
        database: Option<String>,
        /// Directory holding database files [env: TABLE_INGEST_DB_DIR, default: duckdb]
        #[arg(long)]
        db_dir: Option<PathBuf>,
        /// Insert mode (per-row, bulk) [env: TABLE_INGEST_INSERT_MODE]
        #[arg(short, long)]
        mode: Option<String>,
    },
    /// Create a table from its definition
    Create {
        /// Table definition file
        table: PathBuf,
        /// Database name
        #[arg(short, long, env = "DATABASE")]
        database: Option<String>,
        /// Directory holding database files
        #[arg(long, env = "TABLE_INGEST_DB_DIR", default_value = "duckdb")]
        db_dir: PathBuf,
    },
    /// Ingest a data file into a table
    Ingest {
        /// Table definition file
        table: PathBuf,
        /// Data file (JSON, JSONL, CSV or Parquet)
        input: PathBuf,
        /// Database name
        #[arg(short, long, env = "DATABASE")]
        database: Option<String>,
        /// Directory holding database files
        #[arg(long, env = "TABLE_INGEST_DB_DIR", default_value = "duckdb")]
        db_dir: PathBuf,
        /// Insert mode (per-row, bulk)
        #[arg(short, long, default_value = "per-row")]
        mode: String,
    },
    /// Execute SQL against a database
    Query {
        /// SQL query to execute
        sql: String,
        /// Database name
        #[arg(short, long, env = "DATABASE")]
        database: String,
        /// Directory holding database files
        #[arg(long, env = "TABLE_INGEST_DB_DIR", default_value = "duckdb")]
        db_dir: PathBuf,
        /// Output format (table, json, csv)
        #[arg(short, long, default_value = "table")]
        format: String,
    },
    /// Export a table to a Parquet file
    Export {
        /// Table to export
        table: String,
        /// Output file path
        output: PathBuf,
        /// Database name
        #[arg(short, long, env = "DATABASE")]
        database: String,
        /// Directory holding database files
        #[arg(long, env = "TABLE_INGEST_DB_DIR", default_value = "duckdb")]
        db_dir: PathBuf,
    },
}

#[cfg(feature = "cli")]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            table,
            execute,
            database,
            db_dir,
            mode,
        } => {
            let args = RunArgs {
                table,
                execute,
                database,
                db_dir,
                mode,
            };
            handle_run(&args)
        }
        Commands::Create {
            table,
            database,
            db_dir,
        } => {
            let args = CreateArgs {
                table,
                database,
                db_dir,
            };
            handle_create(&args)
        }
        Commands::Ingest {
            table,
            input,
            database,
            db_dir,
            mode,
        } => {
            let args = IngestArgs {
                table,
                input,
                database,
                db_dir,
                mode,
            };
            handle_ingest(&args)
        }
        Commands::Query {
            sql,
            database,
            db_dir,
            format,
        } => {
            let args = QueryArgs {
                sql,
                database,
                db_dir,
                format,
            };
            handle_query(&args)
        }
        Commands::Export {
            table,
            output,
            database,
            db_dir,
        } => {
            let args = ExportArgs {
                table,
                output,
                database,
                db_dir,
            };
            handle_export(&args)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature is not enabled. Build with --features cli");
    std::process::exit(1);
}
