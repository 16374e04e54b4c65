//! Star schema construction
//!
//! Turns the raw source tables into conformed dimensions, a generated date
//! dimension and the `fact_sales` table. The stage either returns a complete
//! [`DimensionalModel`] or an error; nothing partial reaches the loader.

mod date_dim;
mod dimensions;
mod error;
mod facts;
mod integrity;

use std::time::Instant;

use tracing::{debug, error, info};

use crate::config::WarehouseConfig;
use crate::extract::RawData;

pub use date_dim::{DimDate, build_date_dimension, date_key, order_date_range};
pub use dimensions::{DimBrand, DimCategory, DimCustomer, DimProduct, DimStaff, DimStore};
pub use error::TransformError;
pub use facts::{DimensionKeys, FactSale, build_fact_sales, net_sales};
pub use integrity::{ExcludedRow, ExclusionReason, IntegrityReport};

/// Warehouse tables in load order
pub const WAREHOUSE_TABLES: [&str; 8] = [
    "dim_customers",
    "dim_date",
    "dim_staffs",
    "dim_products",
    "dim_brands",
    "dim_categories",
    "dim_stores",
    "fact_sales",
];

/// Every warehouse table, ready to load
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DimensionalModel {
    pub dim_customers: Vec<DimCustomer>,
    pub dim_date: Vec<DimDate>,
    pub dim_staffs: Vec<DimStaff>,
    pub dim_products: Vec<DimProduct>,
    pub dim_brands: Vec<DimBrand>,
    pub dim_categories: Vec<DimCategory>,
    pub dim_stores: Vec<DimStore>,
    pub fact_sales: Vec<FactSale>,
    pub integrity: IntegrityReport,
}

impl DimensionalModel {
    /// Row count per warehouse table, in load order
    pub fn table_counts(&self) -> Vec<(&'static str, usize)> {
        let counts = [
            self.dim_customers.len(),
            self.dim_date.len(),
            self.dim_staffs.len(),
            self.dim_products.len(),
            self.dim_brands.len(),
            self.dim_categories.len(),
            self.dim_stores.len(),
            self.fact_sales.len(),
        ];
        WAREHOUSE_TABLES.into_iter().zip(counts).collect()
    }
}

/// Builds the dimensional model from raw tables
pub struct DataTransformer<'a> {
    config: &'a WarehouseConfig,
}

impl<'a> DataTransformer<'a> {
    pub fn new(config: &'a WarehouseConfig) -> Self {
        Self { config }
    }

    /// Run every transform step in order
    pub fn transform_all(&self, raw: &RawData) -> Result<DimensionalModel, TransformError> {
        let start = Instant::now();
        let result = self.build(raw);

        match &result {
            Ok(model) => {
                for (table, rows) in model.table_counts() {
                    info!(table, rows, "Built warehouse table");
                }
                model.integrity.log();
                debug!(
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Transform complete"
                );
            }
            Err(e) => match e {
                TransformError::Integrity { table, reason, rows } => {
                    error!(table, reason = %reason, rows, "Integrity violation");
                }
                TransformError::InvalidDate { table, column, value, .. } => {
                    error!(table, column, value = %value, "Unparsable date");
                }
            },
        }
        result
    }

    fn build(&self, raw: &RawData) -> Result<DimensionalModel, TransformError> {
        let dim_customers = dimensions::build_customers(&raw.customers)?;
        let dim_staffs = dimensions::build_staffs(&raw.staffs)?;
        let dim_brands = dimensions::build_brands(&raw.brands)?;
        let dim_categories = dimensions::build_categories(&raw.categories)?;
        let dim_stores = dimensions::build_stores(&raw.stores)?;
        let dim_products = dimensions::build_products(&raw.products, &dim_brands, &dim_categories)?;

        let dim_date = match order_date_range(&raw.orders, &self.config.date_format)? {
            Some((first, last)) => {
                debug!(%first, %last, "Order date range");
                build_date_dimension(first, last)
            }
            None => Vec::new(),
        };

        let keys = DimensionKeys::new(
            &dim_customers,
            &dim_products,
            &dim_stores,
            &dim_staffs,
            &dim_date,
        );
        let (fact_sales, integrity) = build_fact_sales(
            &raw.orders,
            &raw.order_items,
            &keys,
            &self.config.date_format,
        )?;

        if self.config.strict_integrity && !integrity.is_clean() {
            let reasons: Vec<String> = integrity
                .reasons
                .iter()
                .map(|(reason, rows)| format!("{reason}={rows}"))
                .collect();
            return Err(TransformError::integrity(
                "fact_sales",
                format!("unresolved line items ({})", reasons.join(", ")),
                integrity.excluded_rows(),
            ));
        }

        Ok(DimensionalModel {
            dim_customers,
            dim_date,
            dim_staffs,
            dim_products,
            dim_brands,
            dim_categories,
            dim_stores,
            fact_sales,
            integrity,
        })
    }
}
