//! Warehouse table definitions
//!
//! Each row type of the dimensional model describes its own table: name,
//! columns with DuckDB types, and table constraints. DDL and insert
//! statements are generated from these descriptions.

use duckdb::types::Value;

use crate::transform::{
    DimBrand, DimCategory, DimCustomer, DimDate, DimProduct, DimStaff, DimStore, FactSale,
};

/// A warehouse column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub nullable: bool,
}

impl Column {
    const fn required(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            nullable: false,
        }
    }

    const fn optional(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            nullable: true,
        }
    }

    /// Bind placeholder; dates are bound as ISO text
    fn placeholder(&self) -> &'static str {
        if self.sql_type == "DATE" {
            "CAST(? AS DATE)"
        } else {
            "?"
        }
    }
}

/// A row type that is loaded into its own warehouse table
pub trait WarehouseTable {
    const NAME: &'static str;
    const COLUMNS: &'static [Column];
    /// Table constraints appended after the column list
    const CONSTRAINTS: &'static [&'static str] = &[];

    /// Column values in `COLUMNS` order
    fn values(&self) -> Vec<Value>;
}

/// `CREATE TABLE` statement for `T`
pub fn create_table_sql<T: WarehouseTable>() -> String {
    let mut lines: Vec<String> = T::COLUMNS
        .iter()
        .map(|c| {
            if c.nullable {
                format!("    {} {}", c.name, c.sql_type)
            } else {
                format!("    {} {} NOT NULL", c.name, c.sql_type)
            }
        })
        .collect();
    lines.extend(T::CONSTRAINTS.iter().map(|c| format!("    {c}")));
    format!("CREATE TABLE {} (\n{}\n)", T::NAME, lines.join(",\n"))
}

/// Multi-row `INSERT` statement for `rows` rows of `T`
pub fn insert_sql<T: WarehouseTable>(rows: usize) -> String {
    let columns: Vec<&str> = T::COLUMNS.iter().map(|c| c.name).collect();
    let placeholders: Vec<&str> = T::COLUMNS.iter().map(Column::placeholder).collect();
    let tuple = format!("({})", placeholders.join(", "));
    let tuples = vec![tuple; rows];
    format!(
        "INSERT INTO {} ({}) VALUES {}",
        T::NAME,
        columns.join(", "),
        tuples.join(", ")
    )
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn opt_text(s: &Option<String>) -> Value {
    s.as_deref().map_or(Value::Null, text)
}

fn opt_bigint(n: Option<i64>) -> Value {
    n.map_or(Value::Null, Value::BigInt)
}

impl WarehouseTable for DimCustomer {
    const NAME: &'static str = "dim_customers";
    const COLUMNS: &'static [Column] = &[
        Column::required("customer_id", "BIGINT"),
        Column::required("first_name", "VARCHAR"),
        Column::required("last_name", "VARCHAR"),
        Column::required("customer_city", "VARCHAR"),
        Column::required("customer_state", "VARCHAR"),
        Column::optional("zip_code", "VARCHAR"),
        Column::optional("email", "VARCHAR"),
        Column::optional("phone", "VARCHAR"),
    ];
    const CONSTRAINTS: &'static [&'static str] = &["PRIMARY KEY (customer_id)"];

    fn values(&self) -> Vec<Value> {
        vec![
            Value::BigInt(self.customer_id),
            text(&self.first_name),
            text(&self.last_name),
            text(&self.customer_city),
            text(&self.customer_state),
            opt_text(&self.zip_code),
            opt_text(&self.email),
            opt_text(&self.phone),
        ]
    }
}

impl WarehouseTable for DimDate {
    const NAME: &'static str = "dim_date";
    const COLUMNS: &'static [Column] = &[
        Column::required("date_key", "INTEGER"),
        Column::required("date", "DATE"),
        Column::required("year", "INTEGER"),
        Column::required("quarter", "VARCHAR"),
        Column::required("month", "VARCHAR"),
        Column::required("month_of_year", "INTEGER"),
        Column::required("day_of_month", "INTEGER"),
        Column::required("day_of_week", "INTEGER"),
        Column::required("day_name", "VARCHAR"),
        Column::required("is_weekend", "BOOLEAN"),
        Column::required("is_month_start", "BOOLEAN"),
        Column::required("is_month_end", "BOOLEAN"),
        Column::required("is_quarter_end", "BOOLEAN"),
        Column::required("is_year_end", "BOOLEAN"),
    ];
    const CONSTRAINTS: &'static [&'static str] = &["PRIMARY KEY (date_key)"];

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Int(self.date_key),
            Value::Text(self.date.to_string()),
            Value::Int(self.year),
            text(&self.quarter),
            text(&self.month),
            Value::Int(self.month_of_year as i32),
            Value::Int(self.day_of_month as i32),
            Value::Int(self.day_of_week as i32),
            text(&self.day_name),
            Value::Boolean(self.is_weekend),
            Value::Boolean(self.is_month_start),
            Value::Boolean(self.is_month_end),
            Value::Boolean(self.is_quarter_end),
            Value::Boolean(self.is_year_end),
        ]
    }
}

impl WarehouseTable for DimStaff {
    const NAME: &'static str = "dim_staffs";
    const COLUMNS: &'static [Column] = &[
        Column::required("staff_id", "BIGINT"),
        Column::required("first_name", "VARCHAR"),
        Column::required("last_name", "VARCHAR"),
        Column::optional("email", "VARCHAR"),
        Column::optional("phone", "VARCHAR"),
        Column::required("active", "BOOLEAN"),
        Column::required("store_id", "BIGINT"),
        Column::optional("manager_id", "BIGINT"),
    ];
    const CONSTRAINTS: &'static [&'static str] = &["PRIMARY KEY (staff_id)"];

    fn values(&self) -> Vec<Value> {
        vec![
            Value::BigInt(self.staff_id),
            text(&self.first_name),
            text(&self.last_name),
            opt_text(&self.email),
            opt_text(&self.phone),
            Value::Boolean(self.active),
            Value::BigInt(self.store_id),
            opt_bigint(self.manager_id),
        ]
    }
}

impl WarehouseTable for DimProduct {
    const NAME: &'static str = "dim_products";
    const COLUMNS: &'static [Column] = &[
        Column::required("product_id", "BIGINT"),
        Column::required("product_name", "VARCHAR"),
        Column::required("brand_id", "BIGINT"),
        Column::required("category_id", "BIGINT"),
        Column::optional("model_year", "INTEGER"),
        Column::required("list_price", "DOUBLE"),
    ];
    const CONSTRAINTS: &'static [&'static str] = &["PRIMARY KEY (product_id)"];

    fn values(&self) -> Vec<Value> {
        vec![
            Value::BigInt(self.product_id),
            text(&self.product_name),
            Value::BigInt(self.brand_id),
            Value::BigInt(self.category_id),
            self.model_year.map_or(Value::Null, Value::Int),
            Value::Double(self.list_price),
        ]
    }
}

impl WarehouseTable for DimBrand {
    const NAME: &'static str = "dim_brands";
    const COLUMNS: &'static [Column] = &[
        Column::required("brand_id", "BIGINT"),
        Column::required("brand_name", "VARCHAR"),
    ];
    const CONSTRAINTS: &'static [&'static str] = &["PRIMARY KEY (brand_id)"];

    fn values(&self) -> Vec<Value> {
        vec![Value::BigInt(self.brand_id), text(&self.brand_name)]
    }
}

impl WarehouseTable for DimCategory {
    const NAME: &'static str = "dim_categories";
    const COLUMNS: &'static [Column] = &[
        Column::required("category_id", "BIGINT"),
        Column::required("category_name", "VARCHAR"),
    ];
    const CONSTRAINTS: &'static [&'static str] = &["PRIMARY KEY (category_id)"];

    fn values(&self) -> Vec<Value> {
        vec![Value::BigInt(self.category_id), text(&self.category_name)]
    }
}

impl WarehouseTable for DimStore {
    const NAME: &'static str = "dim_stores";
    const COLUMNS: &'static [Column] = &[
        Column::required("store_id", "BIGINT"),
        Column::required("store_name", "VARCHAR"),
        Column::optional("phone", "VARCHAR"),
        Column::optional("email", "VARCHAR"),
        Column::optional("street", "VARCHAR"),
        Column::optional("city", "VARCHAR"),
        Column::optional("state", "VARCHAR"),
        Column::optional("zip_code", "VARCHAR"),
    ];
    const CONSTRAINTS: &'static [&'static str] = &["PRIMARY KEY (store_id)"];

    fn values(&self) -> Vec<Value> {
        vec![
            Value::BigInt(self.store_id),
            text(&self.store_name),
            opt_text(&self.phone),
            opt_text(&self.email),
            opt_text(&self.street),
            opt_text(&self.city),
            opt_text(&self.state),
            opt_text(&self.zip_code),
        ]
    }
}

impl WarehouseTable for FactSale {
    const NAME: &'static str = "fact_sales";
    const COLUMNS: &'static [Column] = &[
        Column::required("order_id", "BIGINT"),
        Column::required("item_id", "BIGINT"),
        Column::required("date_key", "INTEGER"),
        Column::required("order_date", "DATE"),
        Column::required("customer_id", "BIGINT"),
        Column::required("product_id", "BIGINT"),
        Column::required("store_id", "BIGINT"),
        Column::required("staff_id", "BIGINT"),
        Column::required("quantity", "BIGINT"),
        Column::required("list_price", "DOUBLE"),
        Column::required("discount", "DOUBLE"),
        Column::required("net_sales", "DOUBLE"),
    ];
    const CONSTRAINTS: &'static [&'static str] = &[
        "PRIMARY KEY (order_id, item_id)",
        "CHECK (discount >= 0 AND discount < 1)",
    ];

    fn values(&self) -> Vec<Value> {
        vec![
            Value::BigInt(self.order_id),
            Value::BigInt(self.item_id),
            Value::Int(self.date_key),
            Value::Text(self.order_date.to_string()),
            Value::BigInt(self.customer_id),
            Value::BigInt(self.product_id),
            Value::BigInt(self.store_id),
            Value::BigInt(self.staff_id),
            Value::BigInt(self.quantity),
            Value::Double(self.list_price),
            Value::Double(self.discount),
            Value::Double(self.net_sales),
        ]
    }
}
