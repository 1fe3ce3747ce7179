//! Run configuration
//!
//! Replaces process-wide environment lookups with an explicit struct that is
//! handed to the pipeline. Environment variables are still honoured, but only
//! through [`RunConfig::apply_env_overrides`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{DatabaseError, DatabaseResult};
use crate::ingest::InsertMode;
use crate::models::TableDefinition;

/// Default directory holding database files
pub const DEFAULT_DB_DIR: &str = "duckdb";

/// Environment variable naming the table definition file
pub const ENV_TABLE: &str = "TABLE";

/// Environment variable naming the data, SQL or script file to execute
pub const ENV_EXECUTE: &str = "EXECUTE";

/// Environment variable naming the database
pub const ENV_DATABASE: &str = "DATABASE";

/// Environment variable overriding the database directory
pub const ENV_DB_DIR: &str = "TABLE_INGEST_DB_DIR";

/// Environment variable selecting the insert mode
pub const ENV_INSERT_MODE: &str = "TABLE_INGEST_INSERT_MODE";

/// Configuration for a single ingestion run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Table definition file (JSON, YAML or TOML)
    #[serde(default)]
    pub table: Option<PathBuf>,

    /// File to execute: records (JSON, JSONL, CSV, Parquet) or SQL
    #[serde(default)]
    pub execute: Option<PathBuf>,

    /// Database name, used when the table definition does not name one
    #[serde(default)]
    pub database: Option<String>,

    /// Directory holding database files
    #[serde(default = "default_db_dir")]
    pub db_dir: PathBuf,

    /// How accepted rows are written
    #[serde(default)]
    pub insert_mode: InsertMode,
}

fn default_db_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DB_DIR)
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            table: None,
            execute: None,
            database: None,
            db_dir: default_db_dir(),
            insert_mode: InsertMode::default(),
        }
    }
}

impl RunConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides read through `lookup`, keyed by the `ENV_*` names
    ///
    /// An unknown insert mode is logged and the current mode is kept.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(ENV_TABLE) {
            self.table = Some(PathBuf::from(path));
        }

        if let Some(path) = lookup(ENV_EXECUTE) {
            self.execute = Some(PathBuf::from(path));
        }

        if let Some(name) = lookup(ENV_DATABASE) {
            self.database = Some(name);
        }

        if let Some(dir) = lookup(ENV_DB_DIR) {
            self.db_dir = PathBuf::from(dir);
        }

        if let Some(mode) = lookup(ENV_INSERT_MODE) {
            match mode.parse() {
                Ok(mode) => self.insert_mode = mode,
                Err(e) => warn!("Ignoring {}: {}", ENV_INSERT_MODE, e),
            }
        }
    }

    /// Load the table definition, if one is configured
    pub fn table_definition(&self) -> DatabaseResult<Option<TableDefinition>> {
        self.table
            .as_deref()
            .map(load_table_definition)
            .transpose()
    }

    /// Database to open: the definition's `database` field wins over
    /// [`RunConfig::database`]
    pub fn database_name(&self, definition: Option<&TableDefinition>) -> Option<String> {
        definition
            .and_then(|d| d.database.clone())
            .or_else(|| self.database.clone())
    }
}

/// Read a table definition file, choosing the parser by extension
///
/// `.yaml`/`.yml` are parsed as YAML, `.toml` as TOML and everything else
/// as JSON.
pub fn load_table_definition(path: &Path) -> DatabaseResult<TableDefinition> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        DatabaseError::IoError(format!(
            "Failed to read table definition {}: {}",
            path.display(),
            e
        ))
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    parse_table_definition(&content, &extension)
        .map_err(|e| DatabaseError::ConfigError(format!("{}: {}", path.display(), e)))
}

/// Parse a table definition in the format named by `extension`
pub fn parse_table_definition(content: &str, extension: &str) -> Result<TableDefinition, String> {
    match extension {
        "yaml" | "yml" => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        "toml" => toml::from_str(content).map_err(|e| e.to_string()),
        _ => serde_json::from_str(content).map_err(|e| e.to_string()),
    }
}
