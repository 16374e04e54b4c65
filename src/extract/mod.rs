//! Extraction of source files into typed in-memory tables
//!
//! The extractor reads every table in the source manifest, applies no
//! business logic, and either returns all tables or fails as a whole.

mod cache;
mod error;
mod reader;
pub mod records;

use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::{SourceTable, WarehouseConfig};

pub use cache::{ExtractCache, SourceFingerprint};
pub use error::ExtractionError;
pub use reader::read_table;
pub use records::{
    BrandRecord, CategoryRecord, CustomerRecord, OrderItemRecord, OrderRecord, ProductRecord,
    SourceRecord, StaffRecord, StockRecord, StoreRecord,
};

/// Every source table, as read from disk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawData {
    pub brands: Vec<BrandRecord>,
    pub categories: Vec<CategoryRecord>,
    pub customers: Vec<CustomerRecord>,
    pub order_items: Vec<OrderItemRecord>,
    pub orders: Vec<OrderRecord>,
    pub products: Vec<ProductRecord>,
    pub staffs: Vec<StaffRecord>,
    pub stocks: Vec<StockRecord>,
    pub stores: Vec<StoreRecord>,
}

impl RawData {
    /// Row count per source table; every table has an entry
    pub fn row_counts(&self) -> BTreeMap<SourceTable, usize> {
        SourceTable::all()
            .into_iter()
            .map(|table| (table, self.row_count(table)))
            .collect()
    }

    /// Row count of one source table
    pub fn row_count(&self, table: SourceTable) -> usize {
        match table {
            SourceTable::Brands => self.brands.len(),
            SourceTable::Categories => self.categories.len(),
            SourceTable::Customers => self.customers.len(),
            SourceTable::OrderItems => self.order_items.len(),
            SourceTable::Orders => self.orders.len(),
            SourceTable::Products => self.products.len(),
            SourceTable::Staffs => self.staffs.len(),
            SourceTable::Stocks => self.stocks.len(),
            SourceTable::Stores => self.stores.len(),
        }
    }

    /// Total rows across all tables
    pub fn total_rows(&self) -> usize {
        self.row_counts().values().sum()
    }
}

/// Reads the configured sources
pub struct DataExtractor<'a> {
    config: &'a WarehouseConfig,
}

impl<'a> DataExtractor<'a> {
    /// Create an extractor over the configured source manifest
    pub fn new(config: &'a WarehouseConfig) -> Self {
        Self { config }
    }

    /// Read every source table
    pub fn extract_data(&self) -> Result<RawData, ExtractionError> {
        let start = Instant::now();

        let data = RawData {
            brands: self.read()?,
            categories: self.read()?,
            customers: self.read()?,
            order_items: self.read()?,
            orders: self.read()?,
            products: self.read()?,
            staffs: self.read()?,
            stocks: self.read()?,
            stores: self.read()?,
        };

        for (table, rows) in data.row_counts() {
            info!(table = %table, rows, "Extracted source table");
        }
        debug!(
            total_rows = data.total_rows(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Extraction complete"
        );

        Ok(data)
    }

    /// Extract through `cache`, re-reading only when a source file changed
    pub fn extract_cached(&self, cache: &mut ExtractCache) -> Result<Rc<RawData>, ExtractionError> {
        let key = self.fingerprints()?;
        if let Some(data) = cache.lookup(&key) {
            info!("Source files unchanged, reusing cached extraction");
            return Ok(data);
        }

        cache.invalidate();
        let data = self.extract_data()?;
        Ok(cache.store(key, data))
    }

    /// Current fingerprint of every source file
    pub fn fingerprints(&self) -> Result<Vec<SourceFingerprint>, ExtractionError> {
        SourceTable::all()
            .into_iter()
            .map(|table| {
                let path = self.config.source_path(table);
                let metadata = std::fs::metadata(&path).map_err(|source| ExtractionError::Open {
                    table,
                    path: path.clone(),
                    source,
                })?;
                Ok(SourceFingerprint {
                    table,
                    modified: metadata.modified().ok(),
                    len: metadata.len(),
                    path,
                })
            })
            .collect()
    }

    fn read<R: SourceRecord>(&self) -> Result<Vec<R>, ExtractionError> {
        read_table(&self.config.source_path(R::TABLE))
    }
}
