//! `retail-etl`: load retail CSV extracts into the DuckDB warehouse

mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use retail_warehouse::config::WarehouseConfig;
use retail_warehouse::pipeline::{EtlPipeline, failure_line};

#[derive(Parser)]
#[command(
    name = "retail-etl",
    version,
    about = "Full-refresh ETL from retail CSV extracts into a DuckDB star schema"
)]
struct Cli {
    /// TOML settings file
    #[arg(short, long, env = "RETAIL_ETL_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the source CSV files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// DuckDB warehouse file
    #[arg(long)]
    database: Option<PathBuf>,

    /// Rows per insert statement
    #[arg(long)]
    batch_size: Option<usize>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// chrono format of date columns in the sources
    #[arg(long)]
    date_format: Option<String>,

    /// Fail instead of excluding line items with unresolved keys
    #[arg(long)]
    strict_integrity: bool,

    /// Validate sources only
    #[arg(long)]
    dry_run: bool,

    /// Write the run record as JSON to this file
    #[arg(long)]
    summary: Option<PathBuf>,
}

impl Cli {
    fn settings(&self) -> anyhow::Result<WarehouseConfig> {
        let mut config = WarehouseConfig::load(self.config.as_deref()).with_context(|| {
            match &self.config {
                Some(path) => format!("loading settings from {}", path.display()),
                None => "loading settings".to_string(),
            }
        })?;

        if let Some(dir) = &self.data_dir {
            config = config.with_data_dir(dir);
        }
        if let Some(path) = &self.database {
            config = config.with_database(path);
        }
        if let Some(size) = self.batch_size {
            config = config.with_batch_size(size);
        }
        if let Some(level) = &self.log_level {
            config = config.with_log_level(level);
        }
        if let Some(format) = &self.date_format {
            config = config.with_date_format(format);
        }
        if self.strict_integrity {
            config = config.with_strict_integrity(true);
        }
        if let Some(path) = &self.summary {
            config = config.with_run_summary(path);
        }

        config.validate().context("validating settings")?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match execute(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli) -> anyhow::Result<ExitCode> {
    let config = cli.settings()?;
    logging::init(&config.log_level);

    let mut pipeline = EtlPipeline::new(config)?.with_dry_run(cli.dry_run);
    match pipeline.run() {
        Ok(report) => {
            println!("{}", report.status_line());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{}", failure_line(&e));
            eprintln!();
            eprintln!("{}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}
