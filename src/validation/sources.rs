//! Source file validation
//!
//! Confirms every file in the source manifest is present and minimally
//! well-formed before extraction starts.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::{SourceTable, WarehouseConfig};

/// Kind of source the validator knows how to check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Delimited text files with a header row
    Csv,
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            _ => Err(format!("Unknown source kind: {}", s)),
        }
    }
}

/// Why a source file failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceIssue {
    Missing,
    NotAFile,
    Empty,
    Unreadable(String),
    NoHeader,
}

impl std::fmt::Display for SourceIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "file does not exist"),
            Self::NotAFile => write!(f, "path is not a regular file"),
            Self::Empty => write!(f, "file is empty"),
            Self::Unreadable(reason) => write!(f, "file is not readable: {reason}"),
            Self::NoHeader => write!(f, "first line is blank, expected a header row"),
        }
    }
}

/// One failed source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceProblem {
    pub table: SourceTable,
    pub path: PathBuf,
    pub issue: SourceIssue,
}

/// One or more required source files are absent or unusable
#[derive(Error, Debug)]
#[error("{} required source file(s) failed validation: {}", .problems.len(), .problems.iter().map(|p| format!("{} ({}): {}", p.table, p.path.display(), p.issue)).collect::<Vec<_>>().join("; "))]
pub struct MissingSourceError {
    pub problems: Vec<SourceProblem>,
}

impl MissingSourceError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        let mut msg = String::from("Missing or unusable source files:\n");
        for problem in &self.problems {
            msg.push_str(&format!(
                "  - {}: {} ({})\n",
                problem.table,
                problem.path.display(),
                problem.issue
            ));
        }
        msg.push_str("\nHint: Check RAW_DATA_DIR and the [sources] section of your config.");
        msg
    }

    /// Log one error event per problem
    pub fn log(&self) {
        for problem in &self.problems {
            error!(
                table = %problem.table,
                path = %problem.path.display(),
                reason = %problem.issue,
                "Source file failed validation"
            );
        }
    }
}

/// Checks source files before any processing starts
pub struct SourceValidator<'a> {
    config: &'a WarehouseConfig,
}

impl<'a> SourceValidator<'a> {
    /// Create a validator over the configured source manifest
    pub fn new(config: &'a WarehouseConfig) -> Self {
        Self { config }
    }

    /// `true` only if every required source of every requested kind passes
    pub fn check_sources(&self, kinds: &HashSet<SourceKind>) -> bool {
        match self.validate_sources(kinds) {
            Ok(()) => true,
            Err(err) => {
                err.log();
                false
            }
        }
    }

    /// Like [`check_sources`](Self::check_sources), returning every problem found
    pub fn validate_sources(&self, kinds: &HashSet<SourceKind>) -> Result<(), MissingSourceError> {
        let mut problems = Vec::new();

        for kind in kinds {
            match kind {
                SourceKind::Csv => problems.extend(self.check_csv()),
            }
        }

        if problems.is_empty() {
            info!(sources = SourceTable::all().len(), "All source files present");
            Ok(())
        } else {
            Err(MissingSourceError { problems })
        }
    }

    fn check_csv(&self) -> Vec<SourceProblem> {
        SourceTable::all()
            .into_iter()
            .filter_map(|table| {
                let path = self.config.source_path(table);
                match check_csv_file(&path) {
                    Ok(()) => {
                        debug!(table = %table, path = %path.display(), "Source file ok");
                        None
                    }
                    Err(issue) => Some(SourceProblem { table, path, issue }),
                }
            })
            .collect()
    }
}

fn check_csv_file(path: &Path) -> Result<(), SourceIssue> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(SourceIssue::Missing),
        Err(e) => return Err(SourceIssue::Unreadable(e.to_string())),
    };
    if !metadata.is_file() {
        return Err(SourceIssue::NotAFile);
    }
    if metadata.len() == 0 {
        return Err(SourceIssue::Empty);
    }

    let file = File::open(path).map_err(|e| SourceIssue::Unreadable(e.to_string()))?;
    let mut header = String::new();
    BufReader::new(file)
        .read_line(&mut header)
        .map_err(|e| SourceIssue::Unreadable(e.to_string()))?;
    if header.trim().is_empty() {
        return Err(SourceIssue::NoHeader);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn csv_kinds() -> HashSet<SourceKind> {
        HashSet::from([SourceKind::Csv])
    }

    fn write_all_sources(dir: &Path) {
        for table in SourceTable::all() {
            std::fs::write(dir.join(table.default_file_name()), "id,name\n1,a\n").unwrap();
        }
    }

    #[test]
    fn test_all_sources_present() {
        let dir = TempDir::new().unwrap();
        write_all_sources(dir.path());
        let config = WarehouseConfig::new().with_data_dir(dir.path());

        assert!(SourceValidator::new(&config).check_sources(&csv_kinds()));
    }

    #[test]
    fn test_missing_source_reported() {
        let dir = TempDir::new().unwrap();
        write_all_sources(dir.path());
        std::fs::remove_file(dir.path().join("orders.csv")).unwrap();
        let config = WarehouseConfig::new().with_data_dir(dir.path());
        let validator = SourceValidator::new(&config);

        assert!(!validator.check_sources(&csv_kinds()));
        let err = validator.validate_sources(&csv_kinds()).unwrap_err();
        assert_eq!(err.problems.len(), 1);
        assert_eq!(err.problems[0].table, SourceTable::Orders);
        assert_eq!(err.problems[0].issue, SourceIssue::Missing);
        assert!(err.user_message().contains("Hint:"));
    }

    #[test]
    fn test_empty_and_headerless_sources() {
        let dir = TempDir::new().unwrap();
        write_all_sources(dir.path());
        std::fs::write(dir.path().join("brands.csv"), "").unwrap();
        std::fs::write(dir.path().join("stores.csv"), "\n1,a\n").unwrap();
        let config = WarehouseConfig::new().with_data_dir(dir.path());

        let err = SourceValidator::new(&config)
            .validate_sources(&csv_kinds())
            .unwrap_err();
        let issues: Vec<_> = err.problems.iter().map(|p| (p.table, p.issue.clone())).collect();
        assert!(issues.contains(&(SourceTable::Brands, SourceIssue::Empty)));
        assert!(issues.contains(&(SourceTable::Stores, SourceIssue::NoHeader)));
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = TempDir::new().unwrap();
        write_all_sources(dir.path());
        std::fs::remove_file(dir.path().join("stocks.csv")).unwrap();
        std::fs::create_dir(dir.path().join("stocks.csv")).unwrap();
        let config = WarehouseConfig::new().with_data_dir(dir.path());

        let err = SourceValidator::new(&config)
            .validate_sources(&csv_kinds())
            .unwrap_err();
        assert_eq!(err.problems[0].issue, SourceIssue::NotAFile);
    }

    #[test]
    fn test_no_kinds_requested() {
        let dir = TempDir::new().unwrap();
        let config = WarehouseConfig::new().with_data_dir(dir.path());
        assert!(SourceValidator::new(&config).check_sources(&HashSet::new()));
    }
}
