//! CSV reading into typed records

use std::fs::File;
use std::path::Path;

use tracing::debug;

use super::error::ExtractionError;
use super::records::SourceRecord;

/// Read a whole CSV file into records of type `R`, preserving row order
///
/// Any malformed row aborts the read; no partial table is returned.
pub fn read_table<R: SourceRecord>(path: &Path) -> Result<Vec<R>, ExtractionError> {
    let file = File::open(path).map_err(|source| ExtractionError::Open {
        table: R::TABLE,
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| ExtractionError::Header {
            table: R::TABLE,
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
        .clone();

    let missing: Vec<String> = R::COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ExtractionError::MissingColumns {
            table: R::TABLE,
            path: path.to_path_buf(),
            missing,
        });
    }

    let mut rows = Vec::new();
    for result in reader.deserialize::<R>() {
        let row = result.map_err(|e| ExtractionError::Malformed {
            table: R::TABLE,
            path: path.to_path_buf(),
            line: e.position().map(|p| p.line()),
            reason: e.to_string(),
        })?;
        rows.push(row);
    }

    debug!(table = %R::TABLE, rows = rows.len(), "Read source table");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceTable;
    use crate::extract::records::{BrandRecord, OrderRecord, StaffRecord};
    use tempfile::TempDir;

    #[test]
    fn test_read_preserves_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("brands.csv");
        std::fs::write(&path, "brand_id,brand_name\n3,Trek\n1,Electra\n2,Haro\n").unwrap();

        let rows: Vec<BrandRecord> = read_table(&path).unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.brand_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(rows[0].brand_name, "Trek");
    }

    #[test]
    fn test_read_null_literals() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("staffs.csv");
        std::fs::write(
            &path,
            "staff_id,first_name,last_name,email,phone,active,store_id,manager_id\n\
             1,Fabiola,Jackson,fabiola.jackson@bikes.shop,(831) 555-5554,1,1,NULL\n\
             2,Mireya,Copeland,,NULL,1,1,1\n",
        )
        .unwrap();

        let rows: Vec<StaffRecord> = read_table(&path).unwrap();
        assert_eq!(rows[0].manager_id, None);
        assert_eq!(rows[1].manager_id, Some(1));
        assert_eq!(rows[1].email, None);
        assert_eq!(rows[1].phone, None);
    }

    #[test]
    fn test_column_order_does_not_matter() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("brands.csv");
        std::fs::write(&path, "brand_name,brand_id\nTrek,9\n").unwrap();

        let rows: Vec<BrandRecord> = read_table(&path).unwrap();
        assert_eq!(rows[0].brand_id, 9);
    }

    #[test]
    fn test_missing_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("orders.csv");
        std::fs::write(&path, "order_id,customer_id,store_id\n1,1,1\n").unwrap();

        let err = read_table::<OrderRecord>(&path).unwrap_err();
        match err {
            ExtractionError::MissingColumns { table, missing, .. } => {
                assert_eq!(table, SourceTable::Orders);
                assert_eq!(missing, vec!["order_date", "staff_id"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("brands.csv");
        std::fs::write(&path, "brand_id,brand_name\n1,Electra\nabc,Haro\n").unwrap();

        let err = read_table::<BrandRecord>(&path).unwrap_err();
        assert!(matches!(err, ExtractionError::Malformed { .. }));
        assert_eq!(err.table(), SourceTable::Brands);
    }

    #[test]
    fn test_ragged_row() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("brands.csv");
        std::fs::write(&path, "brand_id,brand_name\n1,Electra,extra\n").unwrap();

        assert!(matches!(
            read_table::<BrandRecord>(&path),
            Err(ExtractionError::Malformed { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_table::<BrandRecord>(&dir.path().join("gone.csv")).unwrap_err();
        assert!(matches!(err, ExtractionError::Open { .. }));
    }
}
