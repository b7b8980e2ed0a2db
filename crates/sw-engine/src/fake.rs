//! In-memory [`Warehouse`] with injectable failures.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use sw_core::{
    ConsolidatedRecord, ConsolidatedUpdate, MergeOutcome, MonitoredTable, TableRef, Tenant,
    TenantId, Watermark,
};
use sw_warehouse::{Warehouse, WarehouseError, WatermarkSummary};

#[derive(Debug, Clone)]
pub struct FakeTable {
    pub rows: u64,
    pub watermark: Option<Watermark>,
    pub with_watermark: u64,
    pub columns: Vec<String>,
}

impl FakeTable {
    pub fn synced(watermark: &str, rows: u64) -> Self {
        Self {
            rows,
            watermark: Some(watermark.parse().unwrap()),
            with_watermark: rows,
            columns: vec!["id".into(), "_etl_synced".into()],
        }
    }

    pub fn empty() -> Self {
        Self {
            rows: 0,
            watermark: None,
            with_watermark: 0,
            columns: vec!["id".into(), "_etl_synced".into()],
        }
    }

    pub fn null_watermarks(rows: u64) -> Self {
        Self {
            rows,
            ..Self::empty()
        }
    }

    pub fn without_watermark_column(rows: u64) -> Self {
        Self {
            rows,
            watermark: None,
            with_watermark: 0,
            columns: vec!["id".into()],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Fault {
    Denied,
    Malformed,
    Panic,
    Hang,
    /// Existence check works, `row_count` fails.
    CountFails,
}

#[derive(Default)]
pub struct FakeWarehouse {
    tables: HashMap<String, FakeTable>,
    faults: HashMap<String, Fault>,
    metadata: Vec<MonitoredTable>,
    registries: HashMap<String, Vec<Tenant>>,
    broken_registries: HashSet<String>,
    consolidated: Mutex<BTreeMap<(TenantId, String), ConsolidatedRecord>>,
    transient_merges: Mutex<HashMap<(TenantId, String), u32>>,
    failing_merges: HashSet<(TenantId, String)>,
    pub registry_reads: AtomicUsize,
    pub merges: AtomicUsize,
}

impl FakeWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, project: &str, table: &str, data: FakeTable) -> Self {
        self.tables
            .insert(TableRef::new(project, "bronze", table).to_string(), data);
        self
    }

    pub fn with_fault(mut self, project: &str, table: &str, fault: Fault) -> Self {
        self.faults
            .insert(TableRef::new(project, "bronze", table).to_string(), fault);
        self
    }

    pub fn with_metadata(mut self, rows: Vec<MonitoredTable>) -> Self {
        self.metadata = rows;
        self
    }

    pub fn with_registry(mut self, registry: &TableRef, tenants: Vec<Tenant>) -> Self {
        self.registries.insert(registry.to_string(), tenants);
        self
    }

    pub fn with_broken_registry(mut self, registry: &TableRef) -> Self {
        self.broken_registries.insert(registry.to_string());
        self
    }

    pub fn with_consolidated(self, company_id: i64, table: &str) -> Self {
        self.consolidated.lock().unwrap().insert(
            (TenantId(company_id), table.to_string()),
            ConsolidatedRecord {
                company_id: TenantId(company_id),
                table_name: table.to_string(),
                last_etl_synced: None,
                row_count: None,
                updated_at: None,
            },
        );
        self
    }

    pub fn with_transient_merge(self, company_id: i64, table: &str, failures: u32) -> Self {
        self.transient_merges
            .lock()
            .unwrap()
            .insert((TenantId(company_id), table.to_string()), failures);
        self
    }

    pub fn with_failing_merge(mut self, company_id: i64, table: &str) -> Self {
        self.failing_merges
            .insert((TenantId(company_id), table.to_string()));
        self
    }

    pub fn record(&self, company_id: i64, table: &str) -> Option<ConsolidatedRecord> {
        self.consolidated
            .lock()
            .unwrap()
            .get(&(TenantId(company_id), table.to_string()))
            .cloned()
    }

    async fn fault(&self, table: &TableRef) -> Result<(), WarehouseError> {
        match self.faults.get(&table.to_string()) {
            Some(Fault::Denied) => Err(WarehouseError::AccessDenied(format!(
                "permission denied on {table}"
            ))),
            Some(Fault::Malformed) => Err(WarehouseError::Other("Parser Error: syntax error".into())),
            Some(Fault::Panic) => panic!("probe exploded on {table}"),
            Some(Fault::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
            Some(Fault::CountFails) | None => Ok(()),
        }
    }

    fn lookup(&self, table: &TableRef) -> Result<&FakeTable, WarehouseError> {
        self.tables
            .get(&table.to_string())
            .ok_or_else(|| WarehouseError::NotFound(table.to_string()))
    }
}

impl Warehouse for FakeWarehouse {
    async fn table_exists(&self, table: &TableRef) -> Result<bool, WarehouseError> {
        self.fault(table).await?;
        Ok(self.tables.contains_key(&table.to_string()))
    }

    async fn row_count(&self, table: &TableRef) -> Result<u64, WarehouseError> {
        if matches!(self.faults.get(&table.to_string()), Some(Fault::CountFails)) {
            return Err(WarehouseError::Other("count failed".into()));
        }
        Ok(self.lookup(table)?.rows)
    }

    async fn watermark_summary(
        &self,
        table: &TableRef,
        column: &str,
    ) -> Result<WatermarkSummary, WarehouseError> {
        let data = self.lookup(table)?;
        if !data.columns.iter().any(|c| c == column) {
            return Err(WarehouseError::MissingColumn(column.to_string()));
        }
        Ok(WatermarkSummary {
            max: data.watermark,
            count: data.with_watermark,
        })
    }

    async fn column_exists(&self, table: &TableRef, column: &str) -> Result<bool, WarehouseError> {
        Ok(self.lookup(table)?.columns.iter().any(|c| c == column))
    }

    async fn monitored_tables(
        &self,
        _source: &TableRef,
    ) -> Result<Vec<MonitoredTable>, WarehouseError> {
        let mut rows = self.metadata.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn tenant_registry(&self, registry: &TableRef) -> Result<Vec<Tenant>, WarehouseError> {
        self.registry_reads.fetch_add(1, Ordering::SeqCst);
        if self.broken_registries.contains(&registry.to_string()) {
            return Err(WarehouseError::AccessDenied(registry.to_string()));
        }
        self.registries
            .get(&registry.to_string())
            .cloned()
            .ok_or_else(|| WarehouseError::NotFound(registry.to_string()))
    }

    async fn tenant_locations(
        &self,
        registry: &TableRef,
        ids: &[TenantId],
    ) -> Result<Vec<(TenantId, String)>, WarehouseError> {
        let tenants = self.tenant_registry(registry).await?;
        Ok(tenants
            .into_iter()
            .filter(|t| t.active && ids.contains(&t.id))
            .map(|t| (t.id, t.storage_ref))
            .collect())
    }

    async fn consolidated_pairs(
        &self,
        _store: &TableRef,
        tables: &[String],
    ) -> Result<Vec<(TenantId, String)>, WarehouseError> {
        Ok(self
            .consolidated
            .lock()
            .unwrap()
            .keys()
            .filter(|(_, table)| tables.contains(table))
            .cloned()
            .collect())
    }

    async fn merge_consolidated(
        &self,
        _store: &TableRef,
        update: &ConsolidatedUpdate,
    ) -> Result<MergeOutcome, WarehouseError> {
        self.merges.fetch_add(1, Ordering::SeqCst);
        let key = (update.company_id, update.table_name.clone());
        if self.failing_merges.contains(&key) {
            return Err(WarehouseError::AccessDenied("read-only store".into()));
        }
        if let Some(left) = self.transient_merges.lock().unwrap().get_mut(&key) {
            if *left > 0 {
                *left -= 1;
                return Err(WarehouseError::Transient("lock contention".into()));
            }
        }

        let mut store = self.consolidated.lock().unwrap();
        let Some(record) = store.get_mut(&key) else {
            return Ok(MergeOutcome::NoMatch);
        };
        record.last_etl_synced = update.last_etl_synced;
        record.row_count = Some(update.row_count);
        record.updated_at = Some(update.updated_at);
        Ok(MergeOutcome::Updated)
    }

    async fn consolidated_record(
        &self,
        _store: &TableRef,
        company_id: TenantId,
        table_name: &str,
    ) -> Result<Option<ConsolidatedRecord>, WarehouseError> {
        Ok(self.record(company_id.get(), table_name))
    }
}
