//! Pipeline settings
//!
//! Settings are layered, later layers winning:
//!
//! 1. Built-in defaults
//! 2. An optional TOML file
//! 3. Environment variables (a `.env` file in the working directory is loaded first)
//! 4. Command line overrides applied by the binary through the `with_*` builders
//!
//! ```toml
//! data_dir = "data"
//! database_path = "data_warehouse/bikestore.duckdb"
//! batch_size = 1000
//! log_level = "info"
//!
//! [sources]
//! orders = "exports/orders_2024.csv"
//! ```

mod manifest;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use manifest::{SourceManifest, SourceTable};

/// Environment variables read by [`WarehouseConfig::apply_env`]
pub const ENV_DATA_DIR: &str = "RAW_DATA_DIR";
pub const ENV_DATABASE_PATH: &str = "DATABASE_PATH";
pub const ENV_BATCH_SIZE: &str = "BATCH_SIZE";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_DATE_FORMAT: &str = "DATE_FORMAT";
pub const ENV_STRICT_INTEGRITY: &str = "STRICT_INTEGRITY";

/// Errors raised while assembling settings
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A setting has an unusable value
    #[error("Invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Settings consumed by every pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    /// Directory holding the source CSV files
    pub data_dir: PathBuf,
    /// DuckDB warehouse file
    pub database_path: PathBuf,
    /// Rows per insert statement during load
    pub batch_size: usize,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// `chrono` format of date columns in the sources
    pub date_format: String,
    /// Fail the transform stage instead of excluding fact rows with dangling keys
    pub strict_integrity: bool,
    /// Write the run record as JSON here after each run
    pub run_summary_path: Option<PathBuf>,
    /// Per-table file overrides
    pub sources: SourceManifest,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            database_path: PathBuf::from("data_warehouse/bikestore.duckdb"),
            batch_size: 1000,
            log_level: "info".to_string(),
            date_format: "%Y-%m-%d".to_string(),
            strict_integrity: false,
            run_summary_path: None,
            sources: SourceManifest::default(),
        }
    }
}

impl WarehouseConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, then `file` if given, then the process environment
    ///
    /// The result is not validated; callers apply their own overrides and
    /// then call [`WarehouseConfig::validate`].
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match file {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };

        // A missing .env file is the normal case
        let _ = dotenvy::dotenv();
        config.apply_env(|key| std::env::var(key).ok())
    }

    /// Read settings from a TOML file; absent keys keep their defaults
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay values found through `lookup` (normally `std::env::var`)
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup(ENV_DATABASE_PATH) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_BATCH_SIZE) {
            self.batch_size = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_BATCH_SIZE.to_string(),
                value: raw.clone(),
                reason: "expected a positive integer".to_string(),
            })?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = level.to_lowercase();
        }
        if let Some(format) = lookup(ENV_DATE_FORMAT) {
            self.date_format = format;
        }
        if let Some(raw) = lookup(ENV_STRICT_INTEGRITY) {
            self.strict_integrity = match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_STRICT_INTEGRITY.to_string(),
                        value: raw,
                        reason: "expected true or false".to_string(),
                    });
                }
            };
        }
        Ok(self)
    }

    /// Set the source data directory
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Set the warehouse file
    pub fn with_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }

    /// Set the load batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the default log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the source date format
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Enable or disable strict integrity mode
    pub fn with_strict_integrity(mut self, strict: bool) -> Self {
        self.strict_integrity = strict;
        self
    }

    /// Write a JSON run summary after each run
    pub fn with_run_summary(mut self, path: impl Into<PathBuf>) -> Self {
        self.run_summary_path = Some(path.into());
        self
    }

    /// Override the file of one source table
    pub fn with_source_file(mut self, table: SourceTable, path: impl Into<PathBuf>) -> Self {
        self.sources = self.sources.with_file(table, path);
        self
    }

    /// Resolved path of a source table's file
    pub fn source_path(&self, table: SourceTable) -> PathBuf {
        self.sources.path_for(&self.data_dir, table)
    }

    /// Reject settings no stage can work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "batch_size".to_string(),
                value: "0".to_string(),
                reason: "batch size must be at least 1".to_string(),
            });
        }
        if self.date_format.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "date_format".to_string(),
                value: self.date_format.clone(),
                reason: "date format must not be empty".to_string(),
            });
        }
        if let Some(unknown) = self.sources.unknown_tables().first() {
            return Err(ConfigError::InvalidValue {
                key: "sources".to_string(),
                value: unknown.to_string(),
                reason: "not a known source table".to_string(),
            });
        }
        Ok(())
    }
}
