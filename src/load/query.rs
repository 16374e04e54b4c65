//! Read access to a loaded warehouse

use std::path::Path;

use chrono::{DateTime, NaiveDate};
use duckdb::types::Value;

use super::error::LoadError;

/// Read-only view of a warehouse file, used by reporting and tests
pub struct Warehouse {
    conn: duckdb::Connection,
}

impl Warehouse {
    /// Open an existing warehouse file
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let config = duckdb::Config::default()
            .access_mode(duckdb::AccessMode::ReadOnly)
            .map_err(|e| connect_error(path, e))?;
        let conn = duckdb::Connection::open_with_flags(path, config)
            .map_err(|e| connect_error(path, e))?;
        Ok(Self { conn })
    }

    /// Execute a query and return results as JSON
    pub fn query(&self, sql: &str) -> Result<Vec<serde_json::Value>, LoadError> {
        query_json(&self.conn, sql)
    }

    /// Number of rows in `table`
    pub fn row_count(&self, table: &str) -> Result<i64, LoadError> {
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count)
    }

    /// Names of all tables, sorted
    pub fn tables(&self) -> Result<Vec<String>, LoadError> {
        let mut stmt = self
            .conn
            .prepare("SELECT table_name FROM information_schema.tables ORDER BY table_name")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut tables = Vec::new();
        for row in rows {
            tables.push(row?);
        }
        Ok(tables)
    }
}

fn connect_error(path: &Path, err: duckdb::Error) -> LoadError {
    LoadError::Connect {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

pub(crate) fn query_json(
    conn: &duckdb::Connection,
    sql: &str,
) -> Result<Vec<serde_json::Value>, LoadError> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;

    let column_count = rows.as_ref().map(|r| r.column_count()).unwrap_or(0);
    let column_names: Vec<String> = (0..column_count)
        .map(|i| {
            rows.as_ref()
                .and_then(|r| r.column_name(i).ok())
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("col{}", i))
        })
        .collect();

    let mut results = Vec::new();
    while let Some(row) = rows.next()? {
        let mut obj = serde_json::Map::new();
        for (i, name) in column_names.iter().enumerate() {
            let value: Value = row.get(i)?;
            obj.insert(name.clone(), to_json(value));
        }
        results.push(serde_json::Value::Object(obj));
    }
    Ok(results)
}

fn to_json(value: Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(b),
        Value::TinyInt(n) => serde_json::Value::Number(n.into()),
        Value::SmallInt(n) => serde_json::Value::Number(n.into()),
        Value::Int(n) => serde_json::Value::Number(n.into()),
        Value::BigInt(n) => serde_json::Value::Number(n.into()),
        Value::Float(f) => float(f as f64),
        Value::Double(f) => float(f),
        Value::Text(s) => serde_json::Value::String(s),
        Value::Date32(days) => date_from_days(days)
            .map(|d| serde_json::Value::String(d.to_string()))
            .unwrap_or(serde_json::Value::Null),
        other => serde_json::Value::String(format!("{other:?}")),
    }
}

fn float(f: f64) -> serde_json::Value {
    serde_json::Number::from_f64(f)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

/// DuckDB `DATE` values are days since the Unix epoch
fn date_from_days(days: i32) -> Option<NaiveDate> {
    DateTime::from_timestamp(i64::from(days) * 86_400, 0).map(|dt| dt.date_naive())
}
