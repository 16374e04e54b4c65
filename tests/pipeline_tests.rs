//! End-to-end pipeline tests against a real DuckDB file

use std::path::{Path, PathBuf};

use retail_warehouse::config::{SourceTable, WarehouseConfig};
use retail_warehouse::load::Warehouse;
use retail_warehouse::pipeline::{EtlPipeline, PipelineStage, PipelineState, RunRecord, run_pipeline};
use retail_warehouse::transform::{ExclusionReason, WAREHOUSE_TABLES};
use tempfile::TempDir;

const BRANDS: &str = "brand_id,brand_name\n1,Electra\n2,Haro\n3,Trek\n";
const CATEGORIES: &str =
    "category_id,category_name\n1,Children Bicycles\n2,Comfort Bicycles\n3,Cruisers Bicycles\n";
const CUSTOMERS: &str = "customer_id,first_name,last_name,phone,email,street,city,state,zip_code
1,Debra,Burks,NULL,debra.burks@yahoo.com,9273 Thorne Ave.,Orchard Park,NY,14127
2,Kasha,Todd,NULL,kasha.todd@yahoo.com,910 Vine Street,Campbell,CA,95008
3,Tameka,Fisher,NULL,tameka.fisher@aol.com,769C Honey Creek St.,Redondo Beach,CA,90278
";
const STORES: &str = "store_id,store_name,phone,email,street,city,state,zip_code
1,Santa Cruz Bikes,(831) 476-4321,santacruz@bikes.shop,3700 Portola Drive,Santa Cruz,CA,95060
2,Baldwin Bikes,(516) 379-8888,baldwin@bikes.shop,4200 Chestnut Lane,Baldwin,NY,11432
";
const STAFFS: &str = "staff_id,first_name,last_name,email,phone,active,store_id,manager_id
1,Fabiola,Jackson,fabiola.jackson@bikes.shop,(831) 555-5554,1,1,NULL
2,Mireya,Copeland,mireya.copeland@bikes.shop,(831) 555-5555,1,1,1
3,Genna,Serrano,genna.serrano@bikes.shop,(516) 379-4444,1,2,1
";
const PRODUCTS: &str = "product_id,product_name,brand_id,category_id,model_year,list_price
1,Trek 820 - 2016,3,1,2016,379.99
2,Electra Townie Original 21D - 2016,1,2,2016,549.99
3,Haro Downtown 16 - 2017,2,1,2017,329.99
4,Electra Cruiser 1 (24-Inch) - 2016,1,3,2016,269.99
";
const STOCKS: &str = "store_id,product_id,quantity\n1,1,27\n1,2,5\n2,3,14\n";
const ORDERS: &str =
    "order_id,customer_id,order_status,order_date,required_date,shipped_date,store_id,staff_id
1,1,4,2016-01-01,2016-01-03,2016-01-03,1,2
2,2,4,2016-01-01,2016-01-04,2016-01-03,2,3
3,3,4,2016-01-03,2016-01-05,NULL,1,2
4,1,4,2016-01-05,2016-01-08,2016-01-06,2,3
";
const ORDER_ITEMS: &str = "order_id,item_id,product_id,quantity,list_price,discount
1,1,1,1,379.99,0.2
1,2,2,2,549.99,0.07
2,1,3,1,329.99,0.05
3,1,4,3,269.99,0
4,1,1,2,379.99,0.1
4,2,3,1,329.99,0.2
";

fn write_sources(dir: &Path) {
    let files = [
        (SourceTable::Brands, BRANDS),
        (SourceTable::Categories, CATEGORIES),
        (SourceTable::Customers, CUSTOMERS),
        (SourceTable::OrderItems, ORDER_ITEMS),
        (SourceTable::Orders, ORDERS),
        (SourceTable::Products, PRODUCTS),
        (SourceTable::Staffs, STAFFS),
        (SourceTable::Stocks, STOCKS),
        (SourceTable::Stores, STORES),
    ];
    for (table, content) in files {
        std::fs::write(dir.join(table.default_file_name()), content).unwrap();
    }
}

fn append(dir: &Path, table: SourceTable, line: &str) {
    let path = dir.join(table.default_file_name());
    let mut content = std::fs::read_to_string(&path).unwrap();
    content.push_str(line);
    content.push('\n');
    std::fs::write(path, content).unwrap();
}

struct Fixture {
    _temp: TempDir,
    data_dir: PathBuf,
    database: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let data_dir = temp.path().join("data");
        std::fs::create_dir(&data_dir).unwrap();
        write_sources(&data_dir);
        let database = temp.path().join("data_warehouse/bikestore.duckdb");
        Self {
            _temp: temp,
            data_dir,
            database,
        }
    }

    fn config(&self) -> WarehouseConfig {
        WarehouseConfig::new()
            .with_data_dir(&self.data_dir)
            .with_database(&self.database)
            .with_batch_size(2)
    }

    fn count(&self, sql: &str) -> i64 {
        let warehouse = Warehouse::open(&self.database).unwrap();
        let rows = warehouse.query(sql).unwrap();
        rows[0]["n"].as_i64().unwrap()
    }

    fn snapshot(&self) -> Vec<Vec<serde_json::Value>> {
        let warehouse = Warehouse::open(&self.database).unwrap();
        let order_by = [
            ("dim_customers", "customer_id"),
            ("dim_date", "date_key"),
            ("dim_staffs", "staff_id"),
            ("dim_products", "product_id"),
            ("dim_brands", "brand_id"),
            ("dim_categories", "category_id"),
            ("dim_stores", "store_id"),
            ("fact_sales", "order_id, item_id"),
        ];
        order_by
            .iter()
            .map(|(table, key)| {
                warehouse
                    .query(&format!("SELECT * FROM {table} ORDER BY {key}"))
                    .unwrap()
            })
            .collect()
    }
}

mod full_run_tests {
    use super::*;

    #[test]
    fn test_full_run_loads_every_table() {
        let fixture = Fixture::new();
        let report = run_pipeline(fixture.config()).unwrap();

        assert!(report.is_success());
        assert_eq!(report.state, PipelineState::Done);
        assert_eq!(report.stages_completed, PipelineStage::all().to_vec());

        let load = report.load.as_ref().unwrap();
        assert_eq!(load.rows_for("fact_sales"), Some(6));
        assert_eq!(load.rows_for("dim_date"), Some(5));
        assert_eq!(load.rows_for("dim_customers"), Some(3));

        let warehouse = Warehouse::open(&fixture.database).unwrap();
        let mut tables = warehouse.tables().unwrap();
        tables.sort();
        let mut expected: Vec<String> = WAREHOUSE_TABLES.iter().map(|t| t.to_string()).collect();
        expected.sort();
        assert_eq!(tables, expected);
    }

    #[test]
    fn test_published_columns() {
        let fixture = Fixture::new();
        run_pipeline(fixture.config()).unwrap();

        let warehouse = Warehouse::open(&fixture.database).unwrap();
        let rows = warehouse
            .query(
                "SELECT c.customer_city, c.customer_state, p.product_name, b.brand_name, \
                 k.category_name, s.store_name, f.order_date, f.net_sales \
                 FROM fact_sales f \
                 JOIN dim_customers c ON f.customer_id = c.customer_id \
                 JOIN dim_products p ON f.product_id = p.product_id \
                 JOIN dim_brands b ON p.brand_id = b.brand_id \
                 JOIN dim_categories k ON p.category_id = k.category_id \
                 JOIN dim_stores s ON f.store_id = s.store_id \
                 WHERE f.order_id = 1 AND f.item_id = 1",
            )
            .unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["customer_city"], "Orchard Park");
        assert_eq!(row["customer_state"], "NY");
        assert_eq!(row["product_name"], "Trek 820 - 2016");
        assert_eq!(row["brand_name"], "Trek");
        assert_eq!(row["category_name"], "Children Bicycles");
        assert_eq!(row["store_name"], "Santa Cruz Bikes");
        assert_eq!(row["order_date"], "2016-01-01");
        let net = row["net_sales"].as_f64().unwrap();
        assert!((net - 379.99 * 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_reruns_produce_identical_warehouse() {
        let fixture = Fixture::new();

        run_pipeline(fixture.config()).unwrap();
        let first = fixture.snapshot();

        run_pipeline(fixture.config()).unwrap();
        let second = fixture.snapshot();

        assert_eq!(first, second);
        assert_eq!(first[7].len(), 6);
    }

    #[test]
    fn test_run_summary_written() {
        let fixture = Fixture::new();
        let summary = fixture.data_dir.join("runs/last_run.json");
        let report = run_pipeline(fixture.config().with_run_summary(&summary)).unwrap();

        let record = RunRecord::load(&summary).unwrap();
        assert_eq!(record.run_id, report.run_id);
        assert_eq!(record.completed_stages.len(), 4);
        let load = record.get_stage_output(PipelineStage::Load).unwrap();
        assert_eq!(load.metadata["rows"], 6 + 3 + 5 + 3 + 4 + 3 + 3 + 2);
    }

    #[test]
    fn test_source_path_override() {
        let fixture = Fixture::new();
        let moved = fixture.data_dir.join("exports/orders_2016.csv");
        std::fs::create_dir_all(moved.parent().unwrap()).unwrap();
        std::fs::rename(
            fixture.data_dir.join(SourceTable::Orders.default_file_name()),
            &moved,
        )
        .unwrap();

        let config = fixture
            .config()
            .with_source_file(SourceTable::Orders, "exports/orders_2016.csv");
        let report = run_pipeline(config).unwrap();
        assert_eq!(report.load.unwrap().rows_for("fact_sales"), Some(6));
    }
}

mod integrity_tests {
    use super::*;

    #[test]
    fn test_fact_keys_resolve() {
        let fixture = Fixture::new();
        run_pipeline(fixture.config()).unwrap();

        let checks = [
            ("dim_customers", "customer_id"),
            ("dim_products", "product_id"),
            ("dim_stores", "store_id"),
            ("dim_staffs", "staff_id"),
            ("dim_date", "date_key"),
        ];
        for (dim, key) in checks {
            let dangling = fixture.count(&format!(
                "SELECT COUNT(*) AS n FROM fact_sales f LEFT JOIN {dim} d ON f.{key} = d.{key} \
                 WHERE d.{key} IS NULL"
            ));
            assert_eq!(dangling, 0, "dangling {key} references");
        }
    }

    #[test]
    fn test_date_dimension_has_no_gaps() {
        let fixture = Fixture::new();
        run_pipeline(fixture.config()).unwrap();

        let rows = fixture.count("SELECT COUNT(*) AS n FROM dim_date");
        let distinct = fixture.count("SELECT COUNT(DISTINCT date) AS n FROM dim_date");
        let span = fixture.count("SELECT datediff('day', MIN(date), MAX(date)) AS n FROM dim_date");
        let first = fixture.count("SELECT MIN(date_key) AS n FROM dim_date");

        assert_eq!(rows, 5);
        assert_eq!(distinct, rows);
        assert_eq!(span + 1, rows);
        assert_eq!(first, 20160101);
    }

    #[test]
    fn test_unknown_product_excluded_and_counted() {
        let fixture = Fixture::new();
        append(&fixture.data_dir, SourceTable::OrderItems, "4,3,99,1,100.00,0");
        append(&fixture.data_dir, SourceTable::OrderItems, "77,1,1,1,100.00,0");

        let report = run_pipeline(fixture.config()).unwrap();
        let integrity = report.integrity.unwrap();
        assert_eq!(integrity.count(ExclusionReason::UnknownProduct), 1);
        assert_eq!(integrity.orphaned_items(), 1);
        assert_eq!(integrity.fact_rows_in, 8);
        assert_eq!(fixture.count("SELECT COUNT(*) AS n FROM fact_sales"), 6);
    }

    #[test]
    fn test_strict_failure_keeps_previous_warehouse() {
        let fixture = Fixture::new();
        run_pipeline(fixture.config()).unwrap();

        append(&fixture.data_dir, SourceTable::OrderItems, "4,3,99,1,100.00,0");
        let mut pipeline =
            EtlPipeline::new(fixture.config().with_strict_integrity(true)).unwrap();
        let err = pipeline.run().unwrap_err();

        assert_eq!(err.stage(), Some(PipelineStage::Transform));
        assert_eq!(
            pipeline.state(),
            PipelineState::Failed(PipelineStage::Transform)
        );
        assert_eq!(fixture.count("SELECT COUNT(*) AS n FROM fact_sales"), 6);
    }

    #[test]
    fn test_corrupt_discount_fails_transform() {
        let fixture = Fixture::new();
        append(&fixture.data_dir, SourceTable::OrderItems, "4,3,1,1,100.00,1.5");

        let err = run_pipeline(fixture.config()).unwrap_err();
        assert_eq!(err.stage_name(), Some("transform"));
        assert!(!fixture.database.exists());
    }
}

mod failure_tests {
    use super::*;

    #[test]
    fn test_missing_source_stops_at_validation() {
        let fixture = Fixture::new();
        std::fs::remove_file(fixture.data_dir.join("orders.csv")).unwrap();

        let mut pipeline = EtlPipeline::new(fixture.config()).unwrap();
        let err = pipeline.run().unwrap_err();

        assert_eq!(err.stage(), Some(PipelineStage::Validate));
        assert!(err.user_message().contains("orders"));
        assert!(pipeline.cache().is_empty());
        assert!(!fixture.database.exists());

        let record = pipeline.last_run().unwrap();
        assert!(record.completed_stages.is_empty());
        assert!(record.get_stage_output(PipelineStage::Extract).is_none());
    }

    #[test]
    fn test_empty_source_stops_at_validation() {
        let fixture = Fixture::new();
        std::fs::write(fixture.data_dir.join("stocks.csv"), "").unwrap();

        let err = run_pipeline(fixture.config()).unwrap_err();
        assert_eq!(err.stage(), Some(PipelineStage::Validate));
    }

    #[test]
    fn test_schema_drift_stops_at_extract() {
        let fixture = Fixture::new();
        std::fs::write(
            fixture.data_dir.join("brands.csv"),
            "brand_id,label\n1,Electra\n",
        )
        .unwrap();

        let err = run_pipeline(fixture.config()).unwrap_err();
        assert_eq!(err.stage(), Some(PipelineStage::Extract));
        assert!(err.to_string().contains("brand_name"));
    }

    #[test]
    fn test_unwritable_warehouse_fails_at_load() {
        let fixture = Fixture::new();
        std::fs::create_dir_all(&fixture.database).unwrap();

        let mut pipeline = EtlPipeline::new(fixture.config()).unwrap();
        let err = pipeline.run().unwrap_err();

        assert_eq!(err.stage(), Some(PipelineStage::Load));
        assert_eq!(pipeline.state(), PipelineState::Failed(PipelineStage::Load));

        let record = pipeline.last_run().unwrap();
        assert_eq!(record.state, PipelineState::Failed(PipelineStage::Load));
        assert_eq!(
            record.completed_stages,
            vec![
                PipelineStage::Validate,
                PipelineStage::Extract,
                PipelineStage::Transform
            ]
        );
        let load = record.get_stage_output(PipelineStage::Load).unwrap();
        assert!(!load.success);
        assert!(load.error.is_some());
    }

    #[test]
    fn test_dry_run_does_not_touch_warehouse() {
        let fixture = Fixture::new();
        let mut pipeline = EtlPipeline::new(fixture.config())
            .unwrap()
            .with_dry_run(true);

        let report = pipeline.run().unwrap();
        assert!(report.is_success());
        assert!(report.status_line().contains("dry run"));
        assert!(!fixture.database.exists());
    }
}

mod cache_tests {
    use super::*;

    #[test]
    fn test_rerun_reuses_extraction_cache() {
        let fixture = Fixture::new();
        let mut pipeline = EtlPipeline::new(fixture.config()).unwrap();

        pipeline.run().unwrap();
        let second = pipeline.run().unwrap();

        assert_eq!(pipeline.cache().hits(), 1);
        let extract = &second.outputs["extract"];
        assert_eq!(extract.metadata["cache_hit"], true);
        assert_eq!(pipeline.history().len(), 2);
        assert_ne!(pipeline.history()[0].run_id, pipeline.history()[1].run_id);
    }

    #[test]
    fn test_modified_source_invalidates_cache() {
        let fixture = Fixture::new();
        let mut pipeline = EtlPipeline::new(fixture.config()).unwrap();
        pipeline.run().unwrap();

        append(&fixture.data_dir, SourceTable::Brands, "4,Surly");
        let report = pipeline.run().unwrap();

        assert_eq!(pipeline.cache().hits(), 0);
        assert_eq!(report.outputs["extract"].metadata["cache_hit"], false);
        assert_eq!(report.load.unwrap().rows_for("dim_brands"), Some(4));
    }
}
