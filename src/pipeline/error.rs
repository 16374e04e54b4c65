//! Error types for pipeline runs
//!
//! Each stage error is wrapped with the stage it came from so the binary can
//! name the failed stage in its final status line.

use std::path::PathBuf;

use thiserror::Error;

use super::stage::PipelineStage;
use crate::config::ConfigError;
use crate::extract::ExtractionError;
use crate::load::LoadError;
use crate::transform::TransformError;
use crate::validation::MissingSourceError;

/// Errors that can occur during a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Settings are unusable
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Source files missing or unreadable
    #[error(transparent)]
    MissingSource(#[from] MissingSourceError),

    /// Source file could not be read
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Dimensional model could not be built
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// Warehouse could not be written
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Run summary could not be written
    #[error("Cannot write run summary {path}: {message}")]
    Summary { path: PathBuf, message: String },
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Stage the error belongs to
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            Self::MissingSource(_) => Some(PipelineStage::Validate),
            Self::Extraction(_) => Some(PipelineStage::Extract),
            Self::Transform(_) => Some(PipelineStage::Transform),
            Self::Load(_) => Some(PipelineStage::Load),
            Self::Config(_) | Self::Summary { .. } => None,
        }
    }

    /// Get the stage name if this is a stage error
    pub fn stage_name(&self) -> Option<&'static str> {
        self.stage().map(|s| s.name())
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(e) => format!(
                "Configuration error: {e}\n\nHint: Check the config file and environment variables."
            ),
            Self::MissingSource(e) => e.user_message(),
            Self::Extraction(e) => e.user_message(),
            Self::Transform(e) => e.user_message(),
            Self::Load(e) => e.user_message(),
            Self::Summary { .. } => self.to_string(),
        }
    }
}
