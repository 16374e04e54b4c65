//! Typed row schemas for each source table
//!
//! Each struct is the schema contract of one CSV. Columns are matched by
//! header name, so column order in the files does not matter, but every
//! required column must be present.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::SourceTable;

/// A row type read from one source table
pub trait SourceRecord: for<'de> Deserialize<'de> {
    /// Table this record is read from
    const TABLE: SourceTable;
    /// Header columns that must be present
    const COLUMNS: &'static [&'static str];
}

/// Optional column: empty cells and the literal `NULL` read as `None`
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("null") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandRecord {
    pub brand_id: i64,
    pub brand_name: String,
}

impl SourceRecord for BrandRecord {
    const TABLE: SourceTable = SourceTable::Brands;
    const COLUMNS: &'static [&'static str] = &["brand_id", "brand_name"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub category_id: i64,
    pub category_name: String,
}

impl SourceRecord for CategoryRecord {
    const TABLE: SourceTable = SourceTable::Categories;
    const COLUMNS: &'static [&'static str] = &["category_id", "category_name"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub street: Option<String>,
    pub city: String,
    pub state: String,
    #[serde(default, deserialize_with = "nullable")]
    pub zip_code: Option<String>,
}

impl SourceRecord for CustomerRecord {
    const TABLE: SourceTable = SourceTable::Customers;
    const COLUMNS: &'static [&'static str] =
        &["customer_id", "first_name", "last_name", "city", "state"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemRecord {
    pub order_id: i64,
    pub item_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub list_price: f64,
    pub discount: f64,
}

impl SourceRecord for OrderItemRecord {
    const TABLE: SourceTable = SourceTable::OrderItems;
    const COLUMNS: &'static [&'static str] = &[
        "order_id",
        "item_id",
        "product_id",
        "quantity",
        "list_price",
        "discount",
    ];
}

/// Order header; dates stay raw text until the transform stage parses them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: i64,
    pub customer_id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub order_status: Option<i64>,
    pub order_date: String,
    #[serde(default, deserialize_with = "nullable")]
    pub required_date: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub shipped_date: Option<String>,
    pub store_id: i64,
    pub staff_id: i64,
}

impl SourceRecord for OrderRecord {
    const TABLE: SourceTable = SourceTable::Orders;
    const COLUMNS: &'static [&'static str] = &[
        "order_id",
        "customer_id",
        "order_date",
        "store_id",
        "staff_id",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: i64,
    pub product_name: String,
    pub brand_id: i64,
    pub category_id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub model_year: Option<i32>,
    pub list_price: f64,
}

impl SourceRecord for ProductRecord {
    const TABLE: SourceTable = SourceTable::Products;
    const COLUMNS: &'static [&'static str] = &[
        "product_id",
        "product_name",
        "brand_id",
        "category_id",
        "list_price",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffRecord {
    pub staff_id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<String>,
    /// 1 = active, 0 = inactive
    pub active: i64,
    pub store_id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub manager_id: Option<i64>,
}

impl SourceRecord for StaffRecord {
    const TABLE: SourceTable = SourceTable::Staffs;
    const COLUMNS: &'static [&'static str] =
        &["staff_id", "first_name", "last_name", "active", "store_id"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub store_id: i64,
    pub product_id: i64,
    pub quantity: i64,
}

impl SourceRecord for StockRecord {
    const TABLE: SourceTable = SourceTable::Stocks;
    const COLUMNS: &'static [&'static str] = &["store_id", "product_id", "quantity"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    pub store_id: i64,
    pub store_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub street: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub zip_code: Option<String>,
}

impl SourceRecord for StoreRecord {
    const TABLE: SourceTable = SourceTable::Stores;
    const COLUMNS: &'static [&'static str] = &["store_id", "store_name"];
}
