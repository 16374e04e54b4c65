//! Validation functionality
//!
//! Provides validation logic for:
//! - Source files (presence, readability, header row)

pub mod sources;

pub use sources::{MissingSourceError, SourceIssue, SourceKind, SourceProblem, SourceValidator};
