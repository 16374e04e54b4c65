//! Error types for the transform stage

use thiserror::Error;

/// Errors that abort the transform stage
///
/// No partial model is ever produced; the loader only sees a model when
/// every step succeeded.
#[derive(Error, Debug)]
pub enum TransformError {
    /// Referential violation, duplicate key, or corrupt measure value
    #[error("Integrity violation in {table}: {reason} ({rows} row(s) affected)")]
    Integrity {
        table: &'static str,
        reason: String,
        rows: usize,
    },

    /// A date column does not match the configured format
    #[error("Cannot parse {table}.{column} value {value:?} with format {format:?}")]
    InvalidDate {
        table: &'static str,
        column: &'static str,
        value: String,
        format: String,
    },
}

impl TransformError {
    pub(crate) fn integrity(table: &'static str, reason: impl Into<String>, rows: usize) -> Self {
        Self::Integrity {
            table,
            reason: reason.into(),
            rows,
        }
    }

    /// Number of rows behind the failure, if it is an integrity error
    pub fn affected_rows(&self) -> Option<usize> {
        match self {
            Self::Integrity { rows, .. } => Some(*rows),
            Self::InvalidDate { .. } => None,
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            Self::Integrity { .. } => format!(
                "{self}\n\nHint: The source extract is inconsistent. Fix the upstream data and rerun the pipeline."
            ),
            Self::InvalidDate { .. } => {
                format!("{self}\n\nHint: Set DATE_FORMAT to match the source files.")
            }
        }
    }
}
