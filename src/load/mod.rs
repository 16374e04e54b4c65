//! Warehouse loader
//!
//! Persists a [`DimensionalModel`] into a DuckDB file. Every table is
//! replaced inside its own transaction: drop, recreate, insert in chunks,
//! commit. A failure rolls that table back to its previous committed state;
//! tables committed earlier in the same load stay replaced.

mod error;
mod query;
mod schema;

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, info};

use crate::transform::DimensionalModel;

pub use error::LoadError;
pub use query::Warehouse;
pub use schema::{Column, WarehouseTable, create_table_sql, insert_sql};

/// Rows written to one table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableLoad {
    pub table: &'static str,
    pub rows: usize,
    pub duration_ms: u64,
}

/// Outcome of a successful load
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadStats {
    pub tables: Vec<TableLoad>,
}

impl LoadStats {
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }

    pub fn rows_for(&self, table: &str) -> Option<usize> {
        self.tables.iter().find(|t| t.table == table).map(|t| t.rows)
    }
}

/// Owns the warehouse connection for the duration of a load
pub struct DataLoader {
    database_path: PathBuf,
    batch_size: usize,
    conn: Option<duckdb::Connection>,
}

impl DataLoader {
    /// Create a loader; no connection is opened yet
    pub fn new(database_path: impl Into<PathBuf>, batch_size: usize) -> Self {
        Self {
            database_path: database_path.into(),
            batch_size: batch_size.max(1),
            conn: None,
        }
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Open the warehouse file, creating its parent directory if needed
    pub fn connect(&mut self) -> Result<(), LoadError> {
        if self.conn.is_some() {
            return Ok(());
        }

        if let Some(parent) = self.database_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| LoadError::Directory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn =
            duckdb::Connection::open(&self.database_path).map_err(|e| LoadError::Connect {
                path: self.database_path.clone(),
                reason: e.to_string(),
            })?;
        info!(path = %self.database_path.display(), "Connected to warehouse");
        self.conn = Some(conn);
        Ok(())
    }

    /// Replace every warehouse table with the contents of `model`
    pub fn load_all(&mut self, model: &DimensionalModel) -> Result<LoadStats, LoadError> {
        self.connect()?;

        let mut stats = LoadStats::default();
        stats.tables.push(self.replace_table(&model.dim_customers)?);
        stats.tables.push(self.replace_table(&model.dim_date)?);
        stats.tables.push(self.replace_table(&model.dim_staffs)?);
        stats.tables.push(self.replace_table(&model.dim_products)?);
        stats.tables.push(self.replace_table(&model.dim_brands)?);
        stats.tables.push(self.replace_table(&model.dim_categories)?);
        stats.tables.push(self.replace_table(&model.dim_stores)?);
        stats.tables.push(self.replace_table(&model.fact_sales)?);

        info!(
            tables = stats.tables.len(),
            rows = stats.total_rows(),
            "Warehouse load complete"
        );
        Ok(stats)
    }

    /// Atomically replace table `T` with `rows`
    pub fn replace_table<T: WarehouseTable>(&mut self, rows: &[T]) -> Result<TableLoad, LoadError> {
        let start = Instant::now();
        let batch_size = self.batch_size;
        let conn = self.conn.as_mut().ok_or(LoadError::NotConnected)?;

        let result = write_table(conn, rows, batch_size);
        match result {
            Ok(()) => {
                let load = TableLoad {
                    table: T::NAME,
                    rows: rows.len(),
                    duration_ms: start.elapsed().as_millis() as u64,
                };
                info!(table = T::NAME, rows = load.rows, "Loaded table");
                Ok(load)
            }
            Err(e) => {
                error!(table = T::NAME, error = %e, "Table load failed, rolled back");
                Err(LoadError::write(T::NAME, e))
            }
        }
    }

    /// Execute a query against the open connection
    pub fn query(&self, sql: &str) -> Result<Vec<serde_json::Value>, LoadError> {
        let conn = self.conn.as_ref().ok_or(LoadError::NotConnected)?;
        query::query_json(conn, sql)
    }

    /// Close the connection; a no-op when already closed
    pub fn disconnect(&mut self) -> Result<(), LoadError> {
        if let Some(conn) = self.conn.take() {
            conn.close()
                .map_err(|(_, e)| LoadError::Disconnect(e.to_string()))?;
            debug!(path = %self.database_path.display(), "Disconnected from warehouse");
        }
        Ok(())
    }
}

impl Drop for DataLoader {
    fn drop(&mut self) {
        let _ = self.disconnect();
    }
}

fn write_table<T: WarehouseTable>(
    conn: &mut duckdb::Connection,
    rows: &[T],
    batch_size: usize,
) -> Result<(), duckdb::Error> {
    let tx = conn.transaction()?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {};\n{};",
        T::NAME,
        create_table_sql::<T>()
    ))?;

    for (index, chunk) in rows.chunks(batch_size).enumerate() {
        let sql = insert_sql::<T>(chunk.len());
        let params: Vec<duckdb::types::Value> = chunk.iter().flat_map(|row| row.values()).collect();
        tx.execute(&sql, duckdb::params_from_iter(params))?;
        debug!(table = T::NAME, batch = index, rows = chunk.len(), "Inserted batch");
    }

    tx.commit()
}
