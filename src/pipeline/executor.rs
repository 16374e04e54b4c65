//! Pipeline orchestrator for running the ETL stages

use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;
use std::time::Instant;

use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use super::error::{PipelineError, PipelineResult};
use super::run::{RunRecord, RunStatus, StageOutput};
use super::stage::{PipelineStage, PipelineState};
use crate::config::{SourceTable, WarehouseConfig};
use crate::extract::{DataExtractor, ExtractCache, RawData};
use crate::load::{DataLoader, LoadStats};
use crate::transform::{DataTransformer, DimensionalModel, IntegrityReport};
use crate::validation::{SourceKind, SourceValidator};

/// Sequences validation, extraction, transformation and load
///
/// Each call to [`run`](Self::run) starts again from validation. Only the
/// extraction cache survives between runs of the same orchestrator.
pub struct EtlPipeline {
    config: WarehouseConfig,
    dry_run: bool,
    state: PipelineState,
    cache: ExtractCache,
    history: Vec<RunRecord>,
}

impl EtlPipeline {
    /// Create an orchestrator for `config`
    pub fn new(config: WarehouseConfig) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            dry_run: false,
            state: PipelineState::Idle,
            cache: ExtractCache::new(),
            history: Vec::new(),
        })
    }

    /// Only validate sources; nothing is read or written
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    /// Current state machine position
    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn cache(&self) -> &ExtractCache {
        &self.cache
    }

    /// Record of the most recent run
    pub fn last_run(&self) -> Option<&RunRecord> {
        self.history.last()
    }

    /// Every run of this orchestrator, oldest first
    pub fn history(&self) -> &[RunRecord] {
        &self.history
    }

    /// Run every stage in order, stopping at the first failure
    pub fn run(&mut self) -> PipelineResult<PipelineReport> {
        let run_id = Uuid::new_v4().to_string();
        let _span = info_span!("pipeline_run", run_id = %run_id, dry_run = self.dry_run).entered();

        let start = Instant::now();
        let mut record = RunRecord::new(&run_id, self.dry_run);
        self.state = PipelineState::Idle;

        info!(
            run_id = %run_id,
            data_dir = %self.config.data_dir.display(),
            database = %self.config.database_path.display(),
            dry_run = self.dry_run,
            "Starting pipeline"
        );

        let result = self.execute(&mut record);
        if result.is_ok() {
            self.transition(PipelineState::Done);
            record.complete();
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => info!(
                run_id = %run_id,
                duration_ms,
                stages_completed = record.completed_stages.len(),
                "Pipeline completed"
            ),
            Err(e) => error!(
                run_id = %run_id,
                duration_ms,
                stage = e.stage_name().unwrap_or("unknown"),
                error = %e,
                "Pipeline failed"
            ),
        }

        if let Some(path) = &self.config.run_summary_path {
            match record.save(path) {
                Ok(()) => debug!(path = %path.display(), "Run summary written"),
                Err(e) => warn!(error = %e, "Run summary not written"),
            }
        }
        self.history.push(record.clone());

        let outcome = result?;
        Ok(PipelineReport {
            run_id: record.run_id,
            status: record.status,
            state: record.state,
            dry_run: self.dry_run,
            stages_completed: record.completed_stages,
            duration_ms,
            outputs: record.stage_outputs,
            load: outcome.load,
            integrity: outcome.integrity,
        })
    }

    fn execute(&mut self, record: &mut RunRecord) -> PipelineResult<Outcome> {
        let mut outcome = Outcome::default();

        self.stage(record, PipelineStage::Validate, |p| {
            p.run_validate()?;
            let output = StageOutput::success().with_metadata(
                "sources",
                serde_json::json!(SourceTable::all().len()),
            );
            Ok(((), output))
        })?;

        if self.dry_run {
            info!("Dry run, skipping extract, transform and load");
            return Ok(outcome);
        }

        let raw = self.stage(record, PipelineStage::Extract, |p| {
            let hits = p.cache.hits();
            let raw = p.run_extract()?;
            let output = StageOutput::success()
                .with_metadata("rows", serde_json::json!(raw.row_counts()))
                .with_metadata("cache_hit", serde_json::json!(p.cache.hits() > hits));
            Ok((raw, output))
        })?;

        let model = self.stage(record, PipelineStage::Transform, |p| {
            let model = p.run_transform(&raw)?;
            let tables: BTreeMap<&str, usize> = model.table_counts().into_iter().collect();
            let output = StageOutput::success()
                .with_metadata("tables", serde_json::json!(tables))
                .with_metadata(
                    "integrity",
                    serde_json::to_value(&model.integrity).unwrap_or_default(),
                );
            Ok((model, output))
        })?;
        outcome.integrity = Some(model.integrity.clone());

        let stats = self.stage(record, PipelineStage::Load, |p| {
            let stats = p.run_load(&model)?;
            let output = StageOutput::success()
                .with_metadata("rows", serde_json::json!(stats.total_rows()))
                .with_metadata("tables", serde_json::json!(stats.tables));
            Ok((stats, output))
        })?;
        outcome.load = Some(stats);

        Ok(outcome)
    }

    /// Run one stage inside its span, recording the outcome
    fn stage<T>(
        &mut self,
        record: &mut RunRecord,
        stage: PipelineStage,
        f: impl FnOnce(&mut Self) -> PipelineResult<(T, StageOutput)>,
    ) -> PipelineResult<T> {
        let _stage_span = info_span!("pipeline_stage", stage = stage.name()).entered();
        self.transition(stage.running_state());
        record.state = self.state;

        let start = Instant::now();
        let result = f(self);
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok((value, output)) => {
                info!(stage = stage.name(), duration_ms, "Stage completed");
                record.complete_stage(stage, output.with_duration(duration_ms));
                Ok(value)
            }
            Err(e) => {
                error!(stage = stage.name(), error = %e, "Stage failed");
                self.transition(PipelineState::Failed(stage));
                record.fail(
                    stage,
                    StageOutput::failed(e.to_string()).with_duration(duration_ms),
                );
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: PipelineState) {
        debug!(from = %self.state, to = %next, "State transition");
        self.state = next;
    }

    /// Check every configured source file
    pub fn run_validate(&self) -> PipelineResult<()> {
        let kinds = HashSet::from([SourceKind::Csv]);
        SourceValidator::new(&self.config)
            .validate_sources(&kinds)
            .inspect_err(|e| e.log())?;
        Ok(())
    }

    /// Read every source table, reusing the cache when sources are unchanged
    pub fn run_extract(&mut self) -> PipelineResult<Rc<RawData>> {
        let raw = DataExtractor::new(&self.config).extract_cached(&mut self.cache)?;
        Ok(raw)
    }

    /// Build the dimensional model
    pub fn run_transform(&self, raw: &RawData) -> PipelineResult<DimensionalModel> {
        let model = DataTransformer::new(&self.config).transform_all(raw)?;
        Ok(model)
    }

    /// Replace the warehouse tables; the connection is closed on every path
    pub fn run_load(&self, model: &DimensionalModel) -> PipelineResult<LoadStats> {
        let mut loader = DataLoader::new(&self.config.database_path, self.config.batch_size);
        let loaded = loader.load_all(model);
        let closed = loader.disconnect();

        let stats = loaded?;
        closed?;
        Ok(stats)
    }
}

#[derive(Default)]
struct Outcome {
    load: Option<LoadStats>,
    integrity: Option<IntegrityReport>,
}

/// Report from a successful pipeline run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Run ID
    pub run_id: String,
    /// Final status
    pub status: RunStatus,
    pub state: PipelineState,
    pub dry_run: bool,
    /// Completed stages
    pub stages_completed: Vec<PipelineStage>,
    /// Total duration in milliseconds
    pub duration_ms: u64,
    /// Stage outputs
    pub outputs: BTreeMap<String, StageOutput>,
    /// Rows written, absent in dry runs
    pub load: Option<LoadStats>,
    /// Fact rows excluded during transform, absent in dry runs
    pub integrity: Option<IntegrityReport>,
}

impl PipelineReport {
    /// Check if pipeline was successful
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Get formatted duration
    pub fn duration_formatted(&self) -> String {
        let secs = self.duration_ms / 1000;
        let mins = secs / 60;
        let remaining_secs = secs % 60;

        if mins > 0 {
            format!("{}m {}s", mins, remaining_secs)
        } else if secs > 0 {
            format!("{}s", secs)
        } else {
            format!("{}ms", self.duration_ms)
        }
    }

    /// One line naming the outcome
    pub fn status_line(&self) -> String {
        if self.dry_run {
            return format!("Pipeline {} - dry run passed, all sources present", self.run_id);
        }
        let rows = self.load.as_ref().map_or(0, |l| l.total_rows());
        let facts = self
            .load
            .as_ref()
            .and_then(|l| l.rows_for("fact_sales"))
            .unwrap_or(0);
        let excluded = self.integrity.as_ref().map_or(0, |i| i.excluded_rows());
        format!(
            "Pipeline {} - {} in {}: {} rows loaded ({} fact rows, {} line items excluded)",
            self.run_id,
            self.status,
            self.duration_formatted(),
            rows,
            facts,
            excluded
        )
    }

    /// Print summary to stderr
    pub fn print_summary(&self) {
        eprintln!();
        eprintln!("{}", self.status_line());
        for stage in &self.stages_completed {
            if let Some(output) = self.outputs.get(stage.name()) {
                eprintln!("  - {}: ok ({}ms)", stage.name(), output.duration_ms);
            }
        }
    }
}

/// Status line for a failed run
pub fn failure_line(err: &PipelineError) -> String {
    match err.stage_name() {
        Some(stage) => format!("Pipeline failed at stage '{stage}': {err}"),
        None => format!("Pipeline failed: {err}"),
    }
}
