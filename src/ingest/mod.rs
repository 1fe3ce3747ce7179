//! Typed table ingestion
//!
//! Validates loosely-typed records against a [`SchemaCatalog`], generates
//! SQL and inserts rows through a [`Connection`], isolating failures so one
//! bad row never aborts its siblings.
//!
//! ## Example
//!
//! ```rust,ignore
//! use table_ingest::database::DuckDbConnection;
//! use table_ingest::ingest::IngestionEngine;
//! use table_ingest::models::{Column, ErrorPolicy, SchemaCatalog};
//!
//! let conn = DuckDbConnection::in_memory()?;
//! let catalog = SchemaCatalog::new(
//!     "t",
//!     vec![Column::new("id", "INTEGER"), Column::new("label", "VARCHAR")],
//!     Some("id".to_string()),
//!     ErrorPolicy::Convert,
//! )?;
//!
//! let engine = IngestionEngine::new(&catalog);
//! engine.create_table(&conn);
//! let outcome = engine.insert(&conn, &records)?;
//! println!("Inserted {} rows, {} errors", outcome.success_count, outcome.error_count);
//! ```
//!
//! [`SchemaCatalog`]: crate::models::SchemaCatalog
//! [`Connection`]: crate::database::Connection

pub mod coerce;
mod engine;
mod error;

use serde::{Deserialize, Serialize};

pub use coerce::{Coerced, coerce};
pub use engine::{InsertStatement, IngestionEngine};
pub use error::IngestError;

/// Aggregate result of a batch insert
///
/// `success_count + error_count` always equals the number of records
/// submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOutcome {
    /// Rows written to the table
    pub success_count: usize,
    /// Rows rejected by coercion or by the database
    pub error_count: usize,
}

impl InsertOutcome {
    pub fn new(success_count: usize, error_count: usize) -> Self {
        Self {
            success_count,
            error_count,
        }
    }

    /// Number of records accounted for
    pub fn total(&self) -> usize {
        self.success_count + self.error_count
    }

    /// Whether every record was written
    pub fn is_complete(&self) -> bool {
        self.error_count == 0
    }

    pub fn as_tuple(&self) -> (usize, usize) {
        (self.success_count, self.error_count)
    }
}

impl std::fmt::Display for InsertOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Inserted {} rows, {} errors",
            self.success_count, self.error_count
        )
    }
}

/// How accepted rows are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsertMode {
    /// One INSERT per row; a failing row does not affect the others
    #[default]
    PerRow,
    /// One multi-row INSERT; the batch succeeds or fails as a whole
    Bulk,
}

impl std::str::FromStr for InsertMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "per-row" | "per_row" | "row" => Ok(InsertMode::PerRow),
            "bulk" => Ok(InsertMode::Bulk),
            _ => Err(format!(
                "Unknown insert mode: {}. Use 'per-row' or 'bulk'.",
                s
            )),
        }
    }
}

impl std::fmt::Display for InsertMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InsertMode::PerRow => write!(f, "per-row"),
            InsertMode::Bulk => write!(f, "bulk"),
        }
    }
}
