//! Error types for the load stage

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while writing the warehouse
#[derive(Error, Debug)]
pub enum LoadError {
    /// Warehouse file could not be opened
    #[error("Cannot open warehouse {path}: {reason}")]
    Connect { path: PathBuf, reason: String },

    /// Parent directory of the warehouse file could not be created
    #[error("Cannot create warehouse directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Replacing a table failed; the table keeps its previous contents
    #[error("Failed to load {table}: {reason}")]
    Write { table: String, reason: String },

    /// Query against the warehouse failed
    #[error("Query error: {0}")]
    Query(String),

    /// Operation requires an open connection
    #[error("Warehouse connection is not open")]
    NotConnected,

    /// Connection did not close cleanly
    #[error("Failed to close warehouse connection: {0}")]
    Disconnect(String),
}

impl LoadError {
    pub(crate) fn write(table: &str, err: duckdb::Error) -> Self {
        Self::Write {
            table: table.to_string(),
            reason: err.to_string(),
        }
    }

    /// Table being written when the error occurred
    pub fn table(&self) -> Option<&str> {
        match self {
            Self::Write { table, .. } => Some(table),
            _ => None,
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            Self::Connect { path, .. } => format!(
                "{self}\n\nHint: Check that {} is not open in another process.",
                path.display()
            ),
            Self::Directory { .. } => {
                format!("{self}\n\nHint: Check permissions or set DATABASE_PATH.")
            }
            Self::Write { .. } => format!(
                "{self}\n\nHint: Tables loaded before this one were replaced; this table was rolled back."
            ),
            _ => self.to_string(),
        }
    }
}

impl From<duckdb::Error> for LoadError {
    fn from(err: duckdb::Error) -> Self {
        Self::Query(err.to_string())
    }
}
