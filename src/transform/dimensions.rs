//! Conformed dimensions built from the source tables
//!
//! Sources already carry stable integer identifiers, so each dimension keeps
//! its business key as the identifying key. Rows are ordered by key so the
//! output does not depend on source row order.

use std::collections::HashSet;
use std::fmt::Display;

use serde::Serialize;

use super::error::TransformError;
use crate::extract::{
    BrandRecord, CategoryRecord, CustomerRecord, ProductRecord, StaffRecord, StoreRecord,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimCustomer {
    pub customer_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub customer_city: String,
    pub customer_state: String,
    pub zip_code: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimStaff {
    pub staff_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub active: bool,
    pub store_id: i64,
    pub manager_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimProduct {
    pub product_id: i64,
    pub product_name: String,
    pub brand_id: i64,
    pub category_id: i64,
    pub model_year: Option<i32>,
    pub list_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimBrand {
    pub brand_id: i64,
    pub brand_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimCategory {
    pub category_id: i64,
    pub category_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimStore {
    pub store_id: i64,
    pub store_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

/// Sort rows by key and reject duplicate keys
fn keyed<T, K, F>(
    mut rows: Vec<T>,
    table: &'static str,
    column: &str,
    key: F,
) -> Result<Vec<T>, TransformError>
where
    K: Ord + Copy + Display,
    F: Fn(&T) -> K,
{
    rows.sort_by_key(|row| key(row));

    let duplicates: Vec<K> = rows
        .windows(2)
        .filter(|pair| key(&pair[0]) == key(&pair[1]))
        .map(|pair| key(&pair[1]))
        .collect();

    if let Some(first) = duplicates.first() {
        return Err(TransformError::integrity(
            table,
            format!("duplicate {column} {first}"),
            duplicates.len(),
        ));
    }
    Ok(rows)
}

pub fn build_customers(rows: &[CustomerRecord]) -> Result<Vec<DimCustomer>, TransformError> {
    let dims = rows
        .iter()
        .map(|r| DimCustomer {
            customer_id: r.customer_id,
            first_name: r.first_name.clone(),
            last_name: r.last_name.clone(),
            customer_city: r.city.clone(),
            customer_state: r.state.clone(),
            zip_code: r.zip_code.clone(),
            email: r.email.clone(),
            phone: r.phone.clone(),
        })
        .collect();
    keyed(dims, "dim_customers", "customer_id", |d: &DimCustomer| d.customer_id)
}

pub fn build_staffs(rows: &[StaffRecord]) -> Result<Vec<DimStaff>, TransformError> {
    let dims = rows
        .iter()
        .map(|r| DimStaff {
            staff_id: r.staff_id,
            first_name: r.first_name.clone(),
            last_name: r.last_name.clone(),
            email: r.email.clone(),
            phone: r.phone.clone(),
            active: r.active != 0,
            store_id: r.store_id,
            manager_id: r.manager_id,
        })
        .collect();
    keyed(dims, "dim_staffs", "staff_id", |d: &DimStaff| d.staff_id)
}

pub fn build_brands(rows: &[BrandRecord]) -> Result<Vec<DimBrand>, TransformError> {
    let dims = rows
        .iter()
        .map(|r| DimBrand {
            brand_id: r.brand_id,
            brand_name: r.brand_name.clone(),
        })
        .collect();
    keyed(dims, "dim_brands", "brand_id", |d: &DimBrand| d.brand_id)
}

pub fn build_categories(rows: &[CategoryRecord]) -> Result<Vec<DimCategory>, TransformError> {
    let dims = rows
        .iter()
        .map(|r| DimCategory {
            category_id: r.category_id,
            category_name: r.category_name.clone(),
        })
        .collect();
    keyed(dims, "dim_categories", "category_id", |d: &DimCategory| {
        d.category_id
    })
}

pub fn build_stores(rows: &[StoreRecord]) -> Result<Vec<DimStore>, TransformError> {
    let dims = rows
        .iter()
        .map(|r| DimStore {
            store_id: r.store_id,
            store_name: r.store_name.clone(),
            phone: r.phone.clone(),
            email: r.email.clone(),
            street: r.street.clone(),
            city: r.city.clone(),
            state: r.state.clone(),
            zip_code: r.zip_code.clone(),
        })
        .collect();
    keyed(dims, "dim_stores", "store_id", |d: &DimStore| d.store_id)
}

/// Products, checked against the already built brand and category dimensions
pub fn build_products(
    rows: &[ProductRecord],
    brands: &[DimBrand],
    categories: &[DimCategory],
) -> Result<Vec<DimProduct>, TransformError> {
    let brand_ids: HashSet<i64> = brands.iter().map(|b| b.brand_id).collect();
    let category_ids: HashSet<i64> = categories.iter().map(|c| c.category_id).collect();

    let unknown_brands = rows.iter().filter(|r| !brand_ids.contains(&r.brand_id)).count();
    if unknown_brands > 0 {
        return Err(TransformError::integrity(
            "dim_products",
            "brand_id not found in dim_brands",
            unknown_brands,
        ));
    }
    let unknown_categories = rows
        .iter()
        .filter(|r| !category_ids.contains(&r.category_id))
        .count();
    if unknown_categories > 0 {
        return Err(TransformError::integrity(
            "dim_products",
            "category_id not found in dim_categories",
            unknown_categories,
        ));
    }

    let dims = rows
        .iter()
        .map(|r| DimProduct {
            product_id: r.product_id,
            product_name: r.product_name.clone(),
            brand_id: r.brand_id,
            category_id: r.category_id,
            model_year: r.model_year,
            list_price: r.list_price,
        })
        .collect();
    keyed(dims, "dim_products", "product_id", |d: &DimProduct| {
        d.product_id
    })
}
