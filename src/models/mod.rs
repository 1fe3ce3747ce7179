//! Data models for typed ingestion
//!
//! - [`Column`] / [`TypeTag`]: declared columns and their semantic types
//! - [`Value`] / [`Record`]: loosely-typed input rows
//! - [`SchemaCatalog`]: the validated, immutable table description

pub mod catalog;
pub mod column;
pub mod value;

pub use catalog::{ErrorPolicy, SchemaCatalog, TableDefinition, quote_ident};
pub use column::{Column, TypeTag};
pub use value::{Record, Value, record_from_json};
