//! Pipeline stages and run state

use serde::{Deserialize, Serialize};

/// ETL stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    /// Check that every source file is present and readable
    Validate,
    /// Read source files into typed tables
    Extract,
    /// Build the dimensional model
    Transform,
    /// Replace the warehouse tables
    Load,
}

impl PipelineStage {
    /// Get all stages in execution order
    pub fn all() -> [Self; 4] {
        [Self::Validate, Self::Extract, Self::Transform, Self::Load]
    }

    /// Get stage name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Extract => "extract",
            Self::Transform => "transform",
            Self::Load => "load",
        }
    }

    /// Get stage description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Validate => "Check source files",
            Self::Extract => "Read source files",
            Self::Transform => "Build dimensions and facts",
            Self::Load => "Replace warehouse tables",
        }
    }

    /// State the orchestrator is in while this stage runs
    pub fn running_state(&self) -> PipelineState {
        match self {
            Self::Validate => PipelineState::Validating,
            Self::Extract => PipelineState::Extracting,
            Self::Transform => PipelineState::Transforming,
            Self::Load => PipelineState::Loading,
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for PipelineStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "validate" | "check_src" => Ok(Self::Validate),
            "extract" => Ok(Self::Extract),
            "transform" => Ok(Self::Transform),
            "load" => Ok(Self::Load),
            _ => Err(format!("Unknown stage: {}", s)),
        }
    }
}

/// Orchestrator state machine
///
/// `Idle → Validating → Extracting → Transforming → Loading → Done`; any
/// stage failure moves to `Failed` and the remaining stages are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "state", content = "stage")]
pub enum PipelineState {
    Idle,
    Validating,
    Extracting,
    Transforming,
    Loading,
    Done,
    Failed(PipelineStage),
}

impl PipelineState {
    /// Whether the run has finished, successfully or not
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }

    /// Stage that failed, if any
    pub fn failed_stage(&self) -> Option<PipelineStage> {
        match self {
            Self::Failed(stage) => Some(*stage),
            _ => None,
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Validating => write!(f, "validating"),
            Self::Extracting => write!(f, "extracting"),
            Self::Transforming => write!(f, "transforming"),
            Self::Loading => write!(f, "loading"),
            Self::Done => write!(f, "done"),
            Self::Failed(stage) => write!(f, "failed({stage})"),
        }
    }
}
