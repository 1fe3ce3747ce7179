//! Table creation and batch insertion

use tracing::{info, warn};

use super::coerce::{Coerced, coerce};
use super::{IngestError, InsertMode, InsertOutcome};
use crate::database::{Connection, DatabaseResult};
use crate::models::{Record, SchemaCatalog, Value, quote_ident};

/// A generated INSERT with its bound parameters
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    /// SQL text with positional `?` placeholders
    pub sql: String,
    /// Parameters in placeholder order
    pub params: Vec<Value>,
}

/// Rows that survived coercion, plus the number rejected
struct CoercedBatch {
    rows: Vec<Vec<Value>>,
    rejected: usize,
}

/// Inserts records into the table described by a catalog
///
/// The engine borrows the catalog and holds no other state; every call
/// receives the connection explicitly.
#[derive(Debug, Clone, Copy)]
pub struct IngestionEngine<'a> {
    catalog: &'a SchemaCatalog,
    mode: InsertMode,
}

impl<'a> IngestionEngine<'a> {
    pub fn new(catalog: &'a SchemaCatalog) -> Self {
        Self {
            catalog,
            mode: InsertMode::default(),
        }
    }

    /// Set the write strategy used by [`ingest`](Self::ingest)
    pub fn with_mode(mut self, mode: InsertMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        self.catalog
    }

    pub fn mode(&self) -> InsertMode {
        self.mode
    }

    /// Create the table if it does not exist
    ///
    /// Returns `false` on failure; the cause is logged and dropped. Use
    /// [`try_create_table`](Self::try_create_table) to keep it.
    pub fn create_table<C: Connection + ?Sized>(&self, conn: &C) -> bool {
        match self.try_create_table(conn) {
            Ok(()) => true,
            Err(e) => {
                warn!("Error creating table {}: {}", self.catalog.table_name(), e);
                false
            }
        }
    }

    /// Create the table if it does not exist, returning the failure cause
    pub fn try_create_table<C: Connection + ?Sized>(&self, conn: &C) -> DatabaseResult<()> {
        conn.execute(&self.catalog.create_statement(), &[])?;
        info!("Table {} is ready", self.catalog.table_name());
        Ok(())
    }

    /// Insert records using the configured [`InsertMode`]
    pub fn ingest<C: Connection + ?Sized>(
        &self,
        conn: &C,
        records: &[Record],
    ) -> Result<InsertOutcome, IngestError> {
        match self.mode {
            InsertMode::PerRow => self.insert(conn, records),
            InsertMode::Bulk => self.insert_bulk(conn, records),
        }
    }

    /// Insert records one statement per row
    ///
    /// All records are coerced before any SQL is issued, so an `error`
    /// policy mismatch aborts the batch with nothing written. After that,
    /// each accepted row is inserted on its own and a failing row only adds
    /// to the error count.
    pub fn insert<C: Connection + ?Sized>(
        &self,
        conn: &C,
        records: &[Record],
    ) -> Result<InsertOutcome, IngestError> {
        if records.is_empty() {
            return Ok(InsertOutcome::default());
        }

        let batch = self.coerce_batch(records)?;
        if batch.rows.is_empty() {
            warn!("No valid rows to insert into {}", self.catalog.table_name());
            return Ok(InsertOutcome::new(0, records.len()));
        }

        let sql = self.catalog.insert_statement();
        let mut success_count = 0;
        for row in &batch.rows {
            match conn.execute(&sql, row) {
                Ok(_) => success_count += 1,
                Err(e) => warn!("Error inserting row into {}: {}", self.catalog.table_name(), e),
            }
        }

        let outcome = InsertOutcome::new(success_count, records.len() - success_count);
        info!(
            "{} into {} ({} rejected during coercion)",
            outcome,
            self.catalog.table_name(),
            batch.rejected
        );
        Ok(outcome)
    }

    /// Insert all accepted records with a single multi-row statement
    ///
    /// The statement either succeeds or fails as a whole; when it fails every
    /// record is counted as an error.
    pub fn insert_bulk<C: Connection + ?Sized>(
        &self,
        conn: &C,
        records: &[Record],
    ) -> Result<InsertOutcome, IngestError> {
        if records.is_empty() {
            return Ok(InsertOutcome::default());
        }

        let batch = self.coerce_batch(records)?;
        let Some(statement) = self.insert_statement(&batch.rows) else {
            warn!("No SQL generated for {}: all rows invalid", self.catalog.table_name());
            return Ok(InsertOutcome::new(0, records.len()));
        };

        match conn.execute(&statement.sql, &statement.params) {
            Ok(_) => {
                let outcome = InsertOutcome::new(batch.rows.len(), batch.rejected);
                info!("{} into {}", outcome, self.catalog.table_name());
                Ok(outcome)
            }
            Err(e) => {
                warn!(
                    "Bulk insert into {} failed: {}",
                    self.catalog.table_name(),
                    e
                );
                Ok(InsertOutcome::new(0, records.len()))
            }
        }
    }

    /// Build a multi-row INSERT for already coerced rows
    ///
    /// Returns `None` when there are no rows.
    pub fn insert_statement(&self, rows: &[Vec<Value>]) -> Option<InsertStatement> {
        if rows.is_empty() {
            return None;
        }

        let width = self.catalog.columns().len();
        let tuple = format!("({})", vec!["?"; width].join(", "));
        let values = vec![tuple.as_str(); rows.len()].join(",\n    ");

        let sql = format!(
            "INSERT INTO {} ({})\nVALUES\n    {}",
            quote_ident(self.catalog.table_name()),
            self.catalog.column_list(),
            values
        );
        let params = rows.iter().flat_map(|row| row.iter().cloned()).collect();

        Some(InsertStatement { sql, params })
    }

    fn coerce_batch(&self, records: &[Record]) -> Result<CoercedBatch, IngestError> {
        let mut rows = Vec::with_capacity(records.len());
        let mut rejected = 0;

        for record in records {
            match coerce(record, self.catalog)? {
                Coerced::Row(row) => rows.push(row),
                Coerced::Rejected { column } => {
                    warn!("Skipping row due to type mismatch for {}", column);
                    rejected += 1;
                }
            }
        }

        Ok(CoercedBatch { rows, rejected })
    }
}
