//! CLI command handlers

pub mod query;
pub mod run;
pub mod table;
