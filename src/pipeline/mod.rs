//! ETL pipeline orchestration
//!
//! The orchestrator runs four stages strictly in sequence:
//!
//! 1. **Validate**: every source file exists, is non-empty and has a header
//! 2. **Extract**: read the sources into typed tables (cached between runs)
//! 3. **Transform**: build the dimensions, the date dimension and `fact_sales`
//! 4. **Load**: replace each warehouse table inside its own transaction
//!
//! Any failure stops the run; the remaining stages are skipped.
//!
//! # Example
//!
//! ```rust,ignore
//! use retail_warehouse::config::WarehouseConfig;
//! use retail_warehouse::pipeline::EtlPipeline;
//!
//! let config = WarehouseConfig::new()
//!     .with_data_dir("data")
//!     .with_database("data_warehouse/bikestore.duckdb");
//!
//! let mut pipeline = EtlPipeline::new(config)?;
//! let report = pipeline.run()?;
//! println!("{}", report.status_line());
//! ```
//!
//! # Dry Run
//!
//! Validate sources without reading or writing anything:
//!
//! ```rust,ignore
//! let mut pipeline = EtlPipeline::new(config)?.with_dry_run(true);
//! let report = pipeline.run()?;
//! ```

mod error;
mod executor;
mod run;
mod stage;

pub use error::{PipelineError, PipelineResult};
pub use executor::{EtlPipeline, PipelineReport, failure_line};
pub use run::{RunRecord, RunStatus, StageOutput};
pub use stage::{PipelineStage, PipelineState};

use crate::config::WarehouseConfig;

/// Run the pipeline once with the given configuration
pub fn run_pipeline(config: WarehouseConfig) -> PipelineResult<PipelineReport> {
    let mut pipeline = EtlPipeline::new(config)?;
    pipeline.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceTable;
    use tempfile::TempDir;

    #[test]
    fn test_run_pipeline_dry_run() {
        let temp = TempDir::new().unwrap();
        for table in SourceTable::all() {
            std::fs::write(temp.path().join(table.default_file_name()), "id\n1\n").unwrap();
        }
        let database = temp.path().join("w.duckdb");
        let config = WarehouseConfig::new()
            .with_data_dir(temp.path())
            .with_database(&database);

        let mut pipeline = EtlPipeline::new(config).unwrap().with_dry_run(true);
        let report = pipeline.run().unwrap();

        assert!(report.is_success());
        assert_eq!(report.stages_completed, vec![PipelineStage::Validate]);
        assert!(report.load.is_none());
        assert!(!database.exists());
        assert_eq!(pipeline.state(), PipelineState::Done);
    }
}
