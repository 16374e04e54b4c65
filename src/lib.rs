//! Retail Warehouse - full-refresh ETL into a DuckDB star schema
//!
//! Provides:
//! - Settings layered from defaults, TOML, `.env` and the environment
//! - Source file validation
//! - Typed CSV extraction with an explicit extraction cache
//! - Conformed dimensions, a generated date dimension and the `fact_sales` table
//! - Transactional per-table loading into DuckDB
//! - A sequential pipeline orchestrator with per-run records

pub mod config;
pub mod extract;
pub mod load;
pub mod pipeline;
pub mod transform;
pub mod validation;

// Re-export commonly used types
pub use config::{ConfigError, SourceManifest, SourceTable, WarehouseConfig};
pub use extract::{DataExtractor, ExtractCache, ExtractionError, RawData};
pub use load::{DataLoader, LoadError, LoadStats, Warehouse};
pub use pipeline::{
    EtlPipeline, PipelineError, PipelineReport, PipelineResult, PipelineStage, PipelineState,
    RunRecord, run_pipeline,
};
pub use transform::{
    DataTransformer, DimensionalModel, IntegrityReport, TransformError, WAREHOUSE_TABLES,
    net_sales,
};
pub use validation::{MissingSourceError, SourceKind, SourceValidator};
