//! Error types for table ingestion

use thiserror::Error;

use crate::database::DatabaseError;

/// Errors raised while building a catalog or coercing a batch
///
/// Row-level execution failures never appear here: they are absorbed into
/// the error count of an [`InsertOutcome`](super::InsertOutcome).
#[derive(Debug, Error)]
pub enum IngestError {
    /// The table description is not usable
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// A value did not match its column under the `error` policy
    #[error("Value {actual_value} for column '{column}' is not of type {declared_type}")]
    TypeMismatch {
        column: String,
        declared_type: String,
        actual_value: String,
    },

    /// Connection-level failure outside of per-row isolation
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
