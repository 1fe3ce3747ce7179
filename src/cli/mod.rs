//! Command-line interface for table ingestion

pub mod commands;
pub mod error;

pub use error::CliError;
