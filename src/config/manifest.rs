//! Source manifest: the logical source tables and where their files live

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A logical source table delivered as one delimited file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTable {
    Brands,
    Categories,
    Customers,
    OrderItems,
    Orders,
    Products,
    Staffs,
    Stocks,
    Stores,
}

impl SourceTable {
    /// Every source table, in manifest order
    pub fn all() -> [Self; 9] {
        [
            Self::Brands,
            Self::Categories,
            Self::Customers,
            Self::OrderItems,
            Self::Orders,
            Self::Products,
            Self::Staffs,
            Self::Stocks,
            Self::Stores,
        ]
    }

    /// Logical table name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Brands => "brands",
            Self::Categories => "categories",
            Self::Customers => "customers",
            Self::OrderItems => "order_items",
            Self::Orders => "orders",
            Self::Products => "products",
            Self::Staffs => "staffs",
            Self::Stocks => "stocks",
            Self::Stores => "stores",
        }
    }

    /// Default file name inside the data directory
    pub fn default_file_name(&self) -> String {
        format!("{}.csv", self.name())
    }
}

impl std::fmt::Display for SourceTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for SourceTable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|table| table.name() == s.trim().to_lowercase())
            .ok_or_else(|| format!("Unknown table: {}", s))
    }
}

/// Per-table file overrides
///
/// Tables without an entry resolve to `<data_dir>/<table>.csv`. Relative
/// overrides are resolved against the data directory, absolute ones are used
/// as given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceManifest {
    files: BTreeMap<String, PathBuf>,
}

impl SourceManifest {
    /// Override the file for one table
    pub fn with_file(mut self, table: SourceTable, path: impl Into<PathBuf>) -> Self {
        self.files.insert(table.name().to_string(), path.into());
        self
    }

    /// Resolve the path of a table's file
    pub fn path_for(&self, data_dir: &Path, table: SourceTable) -> PathBuf {
        match self.files.get(table.name()) {
            Some(path) => data_dir.join(path),
            None => data_dir.join(table.default_file_name()),
        }
    }

    /// Override keys that do not name a known table
    pub fn unknown_tables(&self) -> Vec<&str> {
        self.files
            .keys()
            .filter(|name| name.parse::<SourceTable>().is_err())
            .map(String::as_str)
            .collect()
    }
}
