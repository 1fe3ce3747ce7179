//! Table Ingest - schema-typed ingestion into an embedded database
//!
//! Provides:
//! - Table catalogs with declared column types and an error policy
//! - Per-record type validation and coercion
//! - SQL generation and batch insertion with per-row failure isolation
//! - Record sources (JSON, JSONL, CSV, Parquet) and ad-hoc SQL execution
//! - A DuckDB connection (feature `duckdb-backend`)

pub mod database;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod source;
pub mod sql;

#[cfg(feature = "cli")]
pub mod cli;

// Re-export commonly used types
#[cfg(feature = "duckdb-backend")]
pub use database::DuckDbConnection;
pub use database::{Connection, DatabaseError, DatabaseResult, QueryResult, RunConfig};
pub use ingest::{IngestError, IngestionEngine, InsertMode, InsertOutcome};
pub use models::{Column, ErrorPolicy, Record, SchemaCatalog, TableDefinition, TypeTag, Value};
pub use pipeline::{PipelineError, RunReport};
pub use source::SourceError;
