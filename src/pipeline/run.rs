//! Record of a single pipeline run

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{PipelineError, PipelineResult};
use super::stage::{PipelineStage, PipelineState};

/// Pipeline execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Run is in progress
    Running,
    /// Every stage succeeded
    Completed,
    /// A stage failed
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Output from a pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutput {
    /// Whether the stage was successful
    pub success: bool,
    /// Stage-specific metadata such as row counts
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Duration in milliseconds
    pub duration_ms: u64,
    /// Failure reason
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl StageOutput {
    /// Create a successful stage output
    pub fn success() -> Self {
        Self {
            success: true,
            metadata: BTreeMap::new(),
            duration_ms: 0,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a failed stage output
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::success()
        }
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Set duration
    pub fn with_duration(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }
}

/// Timestamps, stage outputs and outcome of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Unique pipeline run ID
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    /// Final state of the orchestrator
    pub state: PipelineState,
    /// Validation only
    pub dry_run: bool,
    /// Stages that completed, in order
    pub completed_stages: Vec<PipelineStage>,
    /// Output per stage name
    pub stage_outputs: BTreeMap<String, StageOutput>,
    /// Error message if failed
    pub error: Option<String>,
}

impl RunRecord {
    /// Create a record for a new run
    pub fn new(run_id: impl Into<String>, dry_run: bool) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: Utc::now(),
            finished_at: None,
            status: RunStatus::Running,
            state: PipelineState::Idle,
            dry_run,
            completed_stages: Vec::new(),
            stage_outputs: BTreeMap::new(),
            error: None,
        }
    }

    /// Mark a stage as completed
    pub fn complete_stage(&mut self, stage: PipelineStage, output: StageOutput) {
        self.completed_stages.push(stage);
        self.stage_outputs.insert(stage.name().to_string(), output);
    }

    /// Mark the run as completed
    pub fn complete(&mut self) {
        self.status = RunStatus::Completed;
        self.state = PipelineState::Done;
        self.finished_at = Some(Utc::now());
    }

    /// Mark the run as failed in `stage`
    pub fn fail(&mut self, stage: PipelineStage, output: StageOutput) {
        self.status = RunStatus::Failed;
        self.state = PipelineState::Failed(stage);
        self.error = output.error.clone();
        self.stage_outputs.insert(stage.name().to_string(), output);
        self.finished_at = Some(Utc::now());
    }

    /// Check if a stage has been completed
    pub fn is_stage_completed(&self, stage: PipelineStage) -> bool {
        self.completed_stages.contains(&stage)
    }

    /// Get output from a stage
    pub fn get_stage_output(&self, stage: PipelineStage) -> Option<&StageOutput> {
        self.stage_outputs.get(stage.name())
    }

    /// Wall time of the run so far
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at.unwrap_or_else(Utc::now) - self.started_at
    }

    /// Save the record as JSON
    pub fn save(&self, path: &Path) -> PipelineResult<()> {
        let summary_error = |message: String| PipelineError::Summary {
            path: path.to_path_buf(),
            message,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| summary_error(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| summary_error(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| summary_error(e.to_string()))?;
        Ok(())
    }

    /// Load a record from JSON
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let summary_error = |message: String| PipelineError::Summary {
            path: path.to_path_buf(),
            message,
        };
        let json = std::fs::read_to_string(path).map_err(|e| summary_error(e.to_string()))?;
        serde_json::from_str(&json).map_err(|e| summary_error(e.to_string()))
    }
}
