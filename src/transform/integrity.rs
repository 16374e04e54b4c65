//! Accounting of fact rows excluded during the transform stage

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

/// Maximum number of excluded rows kept as examples
const MAX_SAMPLES: usize = 20;

/// Why a line item did not become a fact row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Line item whose `order_id` has no order header
    MissingOrder,
    UnknownProduct,
    UnknownCustomer,
    UnknownStore,
    UnknownStaff,
    UnknownDate,
}

impl ExclusionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingOrder => "missing_order",
            Self::UnknownProduct => "unknown_product",
            Self::UnknownCustomer => "unknown_customer",
            Self::UnknownStore => "unknown_store",
            Self::UnknownStaff => "unknown_staff",
            Self::UnknownDate => "unknown_date",
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One excluded line item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedRow {
    pub order_id: i64,
    pub item_id: i64,
    pub reason: ExclusionReason,
}

/// Counts of excluded fact rows, by reason
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntegrityReport {
    /// Line items considered
    pub fact_rows_in: usize,
    /// Fact rows produced
    pub fact_rows_out: usize,
    pub reasons: BTreeMap<ExclusionReason, usize>,
    /// First excluded rows, for diagnostics
    pub samples: Vec<ExcludedRow>,
}

impl IntegrityReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one excluded line item
    pub fn record(&mut self, order_id: i64, item_id: i64, reason: ExclusionReason) {
        *self.reasons.entry(reason).or_default() += 1;
        if self.samples.len() < MAX_SAMPLES {
            self.samples.push(ExcludedRow {
                order_id,
                item_id,
                reason,
            });
        }
    }

    /// Excluded rows for one reason
    pub fn count(&self, reason: ExclusionReason) -> usize {
        self.reasons.get(&reason).copied().unwrap_or(0)
    }

    /// Excluded rows across all reasons
    pub fn excluded_rows(&self) -> usize {
        self.reasons.values().sum()
    }

    /// Line items without a parent order
    pub fn orphaned_items(&self) -> usize {
        self.count(ExclusionReason::MissingOrder)
    }

    pub fn is_clean(&self) -> bool {
        self.reasons.is_empty()
    }

    /// Emit the report as structured log events
    pub fn log(&self) {
        if self.is_clean() {
            info!(
                fact_rows = self.fact_rows_out,
                "All line items resolved to dimension keys"
            );
            return;
        }

        for (reason, rows) in &self.reasons {
            warn!(table = "fact_sales", reason = %reason, rows, "Excluded line items");
        }
        for sample in &self.samples {
            warn!(
                order_id = sample.order_id,
                item_id = sample.item_id,
                reason = %sample.reason,
                "Excluded line item"
            );
        }
        warn!(
            rows_in = self.fact_rows_in,
            rows_out = self.fact_rows_out,
            excluded = self.excluded_rows(),
            "Fact table built with exclusions"
        );
    }
}
