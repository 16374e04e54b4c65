//! Error types for extraction

use std::path::PathBuf;

use thiserror::Error;

use crate::config::SourceTable;

/// A source file could not be read into its typed table
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// File vanished or became unreadable after validation
    #[error("Cannot open {table} source {path}: {source}")]
    Open {
        table: SourceTable,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Header row could not be parsed
    #[error("Cannot read header row of {table} source {path}: {reason}")]
    Header {
        table: SourceTable,
        path: PathBuf,
        reason: String,
    },

    /// Header row lacks columns the schema requires
    #[error("{table} source {path} is missing required columns: {}", .missing.join(", "))]
    MissingColumns {
        table: SourceTable,
        path: PathBuf,
        missing: Vec<String>,
    },

    /// A row is malformed or has a value of the wrong type
    #[error("Malformed row in {table} source {path}{}: {reason}", .line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    Malformed {
        table: SourceTable,
        path: PathBuf,
        line: Option<u64>,
        reason: String,
    },
}

impl ExtractionError {
    /// Source table the error refers to
    pub fn table(&self) -> SourceTable {
        match self {
            Self::Open { table, .. }
            | Self::Header { table, .. }
            | Self::MissingColumns { table, .. }
            | Self::Malformed { table, .. } => *table,
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingColumns { .. } => format!(
                "{self}\n\nHint: The export format changed. Compare the header row with the expected schema."
            ),
            Self::Malformed { .. } => format!(
                "{self}\n\nHint: Check delimiters, quoting and UTF-8 encoding around that line."
            ),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExtractionError::MissingColumns {
            table: SourceTable::Orders,
            path: PathBuf::from("data/orders.csv"),
            missing: vec!["order_date".to_string(), "store_id".to_string()],
        };
        let display = err.to_string();
        assert!(display.contains("orders"));
        assert!(display.contains("order_date, store_id"));
        assert_eq!(err.table(), SourceTable::Orders);

        let err = ExtractionError::Malformed {
            table: SourceTable::Brands,
            path: PathBuf::from("data/brands.csv"),
            line: Some(7),
            reason: "invalid digit".to_string(),
        };
        assert!(err.to_string().contains("at line 7"));
        assert!(err.user_message().contains("Hint:"));
    }
}
