//! Central metadata, tenant registry and consolidated store against real
//! `DuckDB` catalogs.

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use sw_config::WarehouseConfig;
use sw_core::{ConsolidatedUpdate, MergeOutcome, TableRef, TenantId, Watermark};
use sw_warehouse::schemas;
use sw_warehouse::{DuckWarehouse, Warehouse};

fn metadata() -> TableRef {
    TableRef::new("central", "management", "metadata_consolidated_tables")
}

fn consolidated() -> TableRef {
    TableRef::new("central", "settings", "companies_consolidated")
}

fn registry() -> TableRef {
    TableRef::new("env-dev", "settings", "companies")
}

fn seeded() -> DuckWarehouse {
    let wh = DuckWarehouse::open_in_memory().unwrap();
    wh.attach_in_memory("central").unwrap();
    wh.attach_in_memory("env-dev").unwrap();
    wh.execute_batch(&schemas::create_metadata_table(&metadata())).unwrap();
    wh.execute_batch(&schemas::create_consolidated_table(&consolidated())).unwrap();
    wh.execute_batch(&schemas::create_registry_table(&registry())).unwrap();
    wh.execute_batch(
        r#"
        INSERT INTO "central"."management"."metadata_consolidated_tables" VALUES
            ('jobs', '/v1/jobs', TRUE, TRUE),
            ('accounts', '/v1/accounts', TRUE, FALSE),
            ('archived', '/v1/archived', FALSE, TRUE),
            ('internal', NULL, TRUE, TRUE);
        INSERT INTO "env-dev"."settings"."companies" VALUES
            (2, 'Beta', 'beta-proj', TRUE),
            (1, 'Acme', 'acme-proj', TRUE),
            (3, 'Gone', 'gone-proj', FALSE);
        INSERT INTO "central"."settings"."companies_consolidated" VALUES
            (2, 'jobs', NULL, NULL, NULL),
            (1, 'jobs', NULL, NULL, NULL),
            (1, 'accounts', NULL, NULL, NULL),
            (1, 'other', NULL, NULL, NULL);
        "#,
    )
    .unwrap();
    wh
}

#[tokio::test]
async fn monitored_tables_exclude_rows_without_endpoint() {
    let wh = seeded();
    let tables = wh.monitored_tables(&metadata()).await.unwrap();

    let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["accounts", "archived", "jobs"]);
    let eligible: Vec<&str> = tables
        .iter()
        .filter(|t| t.is_eligible())
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(eligible, vec!["jobs"]);
}

#[tokio::test]
async fn registry_returns_all_rows_with_flags() {
    let wh = seeded();
    let mut tenants = wh.tenant_registry(&registry()).await.unwrap();
    tenants.sort_by_key(|t| t.id);

    assert_eq!(tenants.len(), 3);
    assert_eq!(tenants[0].name, "Acme");
    assert_eq!(tenants[0].storage_ref, "acme-proj");
    assert!(!tenants[2].active);
}

#[tokio::test]
async fn locations_only_for_active_requested_ids() {
    let wh = seeded();
    let found = wh
        .tenant_locations(&registry(), &[TenantId(1), TenantId(3), TenantId(9)])
        .await
        .unwrap();
    assert_eq!(found, vec![(TenantId(1), "acme-proj".to_string())]);

    let none = wh.tenant_locations(&registry(), &[]).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn pairs_are_filtered_and_ordered() {
    let wh = seeded();
    let pairs = wh
        .consolidated_pairs(&consolidated(), &["jobs".to_string(), "accounts".to_string()])
        .await
        .unwrap();
    assert_eq!(
        pairs,
        vec![
            (TenantId(1), "accounts".to_string()),
            (TenantId(1), "jobs".to_string()),
            (TenantId(2), "jobs".to_string()),
        ]
    );
}

#[tokio::test]
async fn merge_updates_existing_and_skips_missing_keys() {
    let wh = seeded();
    let watermark: Watermark = "2024-05-01T08:15:00Z".parse().unwrap();
    let at = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();

    let update = ConsolidatedUpdate {
        company_id: TenantId(1),
        table_name: "jobs".into(),
        last_etl_synced: Some(watermark),
        row_count: 42,
        updated_at: at,
    };
    let outcome = wh.merge_consolidated(&consolidated(), &update).await.unwrap();
    assert_eq!(outcome, MergeOutcome::Updated);

    let record = wh
        .consolidated_record(&consolidated(), TenantId(1), "jobs")
        .await
        .unwrap()
        .expect("record exists");
    assert_eq!(record.last_etl_synced, Some(watermark));
    assert_eq!(record.row_count, Some(42));
    assert_eq!(record.updated_at, Some(at));

    let missing = ConsolidatedUpdate {
        company_id: TenantId(77),
        ..update
    };
    let outcome = wh.merge_consolidated(&consolidated(), &missing).await.unwrap();
    assert_eq!(outcome, MergeOutcome::NoMatch);
    assert!(
        wh.consolidated_record(&consolidated(), TenantId(77), "jobs")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn null_watermark_is_written() {
    let wh = seeded();
    let update = ConsolidatedUpdate {
        company_id: TenantId(2),
        table_name: "jobs".into(),
        last_etl_synced: None,
        row_count: 0,
        updated_at: Utc::now(),
    };
    wh.merge_consolidated(&consolidated(), &update).await.unwrap();

    let record = wh
        .consolidated_record(&consolidated(), TenantId(2), "jobs")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.last_etl_synced, None);
    assert_eq!(record.row_count, Some(0));
}

#[tokio::test]
async fn open_attaches_configured_catalogs() {
    let dir = tempfile::tempdir().unwrap();
    let tenant_db = dir.path().join("tenant.duckdb");
    {
        let conn = duckdb::Connection::open(&tenant_db).unwrap();
        conn.execute_batch(
            "CREATE SCHEMA bronze;
             CREATE TABLE bronze.jobs (id BIGINT, _etl_synced TIMESTAMPTZ);
             INSERT INTO bronze.jobs VALUES (1, '2024-01-01 00:00:00+00');",
        )
        .unwrap();
    }

    let mut config = WarehouseConfig {
        database: ":memory:".into(),
        read_only: true,
        ..WarehouseConfig::default()
    };
    config
        .attach
        .insert("tenant-x".into(), tenant_db.display().to_string());

    let wh = DuckWarehouse::open(&config).unwrap();
    let jobs = TableRef::new("tenant-x", "bronze", "jobs");
    assert!(wh.table_exists(&jobs).await.unwrap());
    assert_eq!(wh.row_count(&jobs).await.unwrap(), 1);
}
