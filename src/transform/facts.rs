//! Sales fact table at the order line grain

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use super::date_dim::{DimDate, date_key, parse_order_date};
use super::dimensions::{DimCustomer, DimProduct, DimStaff, DimStore};
use super::error::TransformError;
use super::integrity::{ExclusionReason, IntegrityReport};
use crate::extract::{OrderItemRecord, OrderRecord};

/// One order line item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactSale {
    pub order_id: i64,
    pub item_id: i64,
    pub date_key: i32,
    pub order_date: NaiveDate,
    pub customer_id: i64,
    pub product_id: i64,
    pub store_id: i64,
    pub staff_id: i64,
    pub quantity: i64,
    pub list_price: f64,
    pub discount: f64,
    pub net_sales: f64,
}

/// `quantity × list_price × (1 − discount)`
pub fn net_sales(quantity: i64, list_price: f64, discount: f64) -> f64 {
    quantity as f64 * list_price * (1.0 - discount)
}

/// Keys present in each dimension a fact row references
#[derive(Debug, Default)]
pub struct DimensionKeys {
    customers: HashSet<i64>,
    products: HashSet<i64>,
    stores: HashSet<i64>,
    staffs: HashSet<i64>,
    dates: HashSet<i32>,
}

impl DimensionKeys {
    pub fn new(
        customers: &[DimCustomer],
        products: &[DimProduct],
        stores: &[DimStore],
        staffs: &[DimStaff],
        dates: &[DimDate],
    ) -> Self {
        Self {
            customers: customers.iter().map(|d| d.customer_id).collect(),
            products: products.iter().map(|d| d.product_id).collect(),
            stores: stores.iter().map(|d| d.store_id).collect(),
            staffs: staffs.iter().map(|d| d.staff_id).collect(),
            dates: dates.iter().map(|d| d.date_key).collect(),
        }
    }

    /// First dimension reference of `fact` that does not resolve
    fn unresolved(&self, fact: &FactSale) -> Option<ExclusionReason> {
        if !self.products.contains(&fact.product_id) {
            Some(ExclusionReason::UnknownProduct)
        } else if !self.customers.contains(&fact.customer_id) {
            Some(ExclusionReason::UnknownCustomer)
        } else if !self.stores.contains(&fact.store_id) {
            Some(ExclusionReason::UnknownStore)
        } else if !self.staffs.contains(&fact.staff_id) {
            Some(ExclusionReason::UnknownStaff)
        } else if !self.dates.contains(&fact.date_key) {
            Some(ExclusionReason::UnknownDate)
        } else {
            None
        }
    }
}

/// Reject measure values that can only come from corrupt sources
fn check_measures(items: &[&OrderItemRecord]) -> Result<(), TransformError> {
    let bad_discount: Vec<&&OrderItemRecord> = items
        .iter()
        .filter(|item| !(0.0..1.0).contains(&item.discount))
        .collect();
    if let Some(first) = bad_discount.first() {
        return Err(TransformError::integrity(
            "order_items",
            format!(
                "discount {} outside [0, 1) for order {} item {}",
                first.discount, first.order_id, first.item_id
            ),
            bad_discount.len(),
        ));
    }

    let invalid = items
        .iter()
        .filter(|item| item.quantity < 0 || item.list_price < 0.0 || !item.list_price.is_finite())
        .count();
    if invalid > 0 {
        return Err(TransformError::integrity(
            "order_items",
            "negative or non-finite quantity/list_price",
            invalid,
        ));
    }
    Ok(())
}

/// Join line items to their orders and resolve every dimension key
///
/// Line items without an order, or whose keys do not resolve, are left out
/// and counted in the returned report. Facts are ordered by
/// `(order_id, item_id)`.
pub fn build_fact_sales(
    orders: &[OrderRecord],
    items: &[OrderItemRecord],
    keys: &DimensionKeys,
    date_format: &str,
) -> Result<(Vec<FactSale>, IntegrityReport), TransformError> {
    let mut report = IntegrityReport::new();
    report.fact_rows_in = items.len();

    let mut headers: HashMap<i64, (&OrderRecord, NaiveDate)> = HashMap::with_capacity(orders.len());
    for order in orders {
        let date = parse_order_date(order, date_format)?;
        if headers.insert(order.order_id, (order, date)).is_some() {
            return Err(TransformError::integrity(
                "orders",
                format!("duplicate order_id {}", order.order_id),
                1,
            ));
        }
    }

    let mut joined = Vec::with_capacity(items.len());
    for item in items {
        match headers.get(&item.order_id) {
            Some(header) => joined.push((item, *header)),
            None => report.record(item.order_id, item.item_id, ExclusionReason::MissingOrder),
        }
    }

    let mut joined_items: Vec<&OrderItemRecord> = joined.iter().map(|(item, _)| *item).collect();
    check_measures(&joined_items)?;

    // Duplicates count even when one copy is excluded below
    joined_items.sort_by_key(|item| (item.order_id, item.item_id));
    let duplicates = joined_items
        .windows(2)
        .filter(|pair| (pair[0].order_id, pair[0].item_id) == (pair[1].order_id, pair[1].item_id))
        .count();
    if duplicates > 0 {
        return Err(TransformError::integrity(
            "fact_sales",
            "duplicate (order_id, item_id)",
            duplicates,
        ));
    }

    let mut facts = Vec::with_capacity(joined.len());
    for (item, (order, date)) in joined {
        let fact = FactSale {
            order_id: item.order_id,
            item_id: item.item_id,
            date_key: date_key(date),
            order_date: date,
            customer_id: order.customer_id,
            product_id: item.product_id,
            store_id: order.store_id,
            staff_id: order.staff_id,
            quantity: item.quantity,
            list_price: item.list_price,
            discount: item.discount,
            net_sales: net_sales(item.quantity, item.list_price, item.discount),
        };
        match keys.unresolved(&fact) {
            Some(reason) => report.record(fact.order_id, fact.item_id, reason),
            None => facts.push(fact),
        }
    }

    facts.sort_by_key(|f| (f.order_id, f.item_id));
    report.fact_rows_out = facts.len();
    Ok((facts, report))
}
