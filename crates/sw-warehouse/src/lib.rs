//! # sw-warehouse
//!
//! Warehouse access for syncwatch.
//!
//! The [`Warehouse`] trait is the seam between the scan/reconcile engine and
//! the storage backend. It covers the four stores the engine touches:
//! - the central metadata table (which bronze tables are monitored)
//! - per-environment tenant registries
//! - per-tenant bronze tables (existence, row count, watermark aggregate)
//! - the central consolidated store (pair listing, update-only merge)
//!
//! [`DuckWarehouse`] implements it on `DuckDB`. Each storage project is an
//! attached catalog, so a `project.dataset.table` reference is queried as
//! `"catalog"."schema"."table"`. `DuckDB` calls are synchronous; they run on
//! the blocking pool with a cloned connection per call.

use std::future::Future;

use sw_core::{
    ConsolidatedRecord, ConsolidatedUpdate, MergeOutcome, MonitoredTable, TableRef, Tenant,
    TenantId, Watermark,
};

pub mod error;
pub mod retry;
pub mod schemas;
pub mod store;

pub use error::WarehouseError;
pub use retry::{RetryConfig, with_retry};
pub use store::DuckWarehouse;

/// Result of the watermark aggregate over rows with a non-null watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatermarkSummary {
    /// `MAX(watermark)`, `None` when no row qualifies.
    pub max: Option<Watermark>,
    /// Number of rows with a non-null watermark.
    pub count: u64,
}

/// Read/write access to the warehouse stores.
///
/// Implementations must be cheap to share behind an `Arc`; every method takes
/// `&self` and may be called from many tasks at once.
pub trait Warehouse: Send + Sync + 'static {
    /// Whether the table exists.
    fn table_exists(
        &self,
        table: &TableRef,
    ) -> impl Future<Output = Result<bool, WarehouseError>> + Send;

    /// Total number of rows.
    fn row_count(&self, table: &TableRef)
    -> impl Future<Output = Result<u64, WarehouseError>> + Send;

    /// `MAX(column)` and `COUNT(*)` over rows where `column` is not null.
    fn watermark_summary(
        &self,
        table: &TableRef,
        column: &str,
    ) -> impl Future<Output = Result<WatermarkSummary, WarehouseError>> + Send;

    /// Whether `column` exists on the table.
    fn column_exists(
        &self,
        table: &TableRef,
        column: &str,
    ) -> impl Future<Output = Result<bool, WarehouseError>> + Send;

    /// Metadata rows with a non-null endpoint, ordered by table name.
    fn monitored_tables(
        &self,
        source: &TableRef,
    ) -> impl Future<Output = Result<Vec<MonitoredTable>, WarehouseError>> + Send;

    /// Every tenant in a registry, active or not.
    fn tenant_registry(
        &self,
        registry: &TableRef,
    ) -> impl Future<Output = Result<Vec<Tenant>, WarehouseError>> + Send;

    /// Storage references of the active tenants among `ids`.
    fn tenant_locations(
        &self,
        registry: &TableRef,
        ids: &[TenantId],
    ) -> impl Future<Output = Result<Vec<(TenantId, String)>, WarehouseError>> + Send;

    /// Distinct (tenant, table) keys of the consolidated store restricted to
    /// `tables`, ordered by tenant id then table name.
    fn consolidated_pairs(
        &self,
        store: &TableRef,
        tables: &[String],
    ) -> impl Future<Output = Result<Vec<(TenantId, String)>, WarehouseError>> + Send;

    /// Update-only merge of one consolidated record.
    fn merge_consolidated(
        &self,
        store: &TableRef,
        update: &ConsolidatedUpdate,
    ) -> impl Future<Output = Result<MergeOutcome, WarehouseError>> + Send;

    /// Read one consolidated record.
    fn consolidated_record(
        &self,
        store: &TableRef,
        company_id: TenantId,
        table_name: &str,
    ) -> impl Future<Output = Result<Option<ConsolidatedRecord>, WarehouseError>> + Send;
}
