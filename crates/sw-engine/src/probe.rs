//! Storage probe: freshness and row count of one tenant's bronze table.
//!
//! A probe always resolves to a [`ProbeResult`]. Missing tables, missing
//! watermark columns, empty tables, denied permissions and timeouts are all
//! statuses, never errors.

use std::sync::Arc;
use std::time::Duration;

use sw_config::ScanConfig;
use sw_core::{ProbeResult, ProbeStatus, TableRef, TenantId};
use sw_warehouse::{Warehouse, WarehouseError, WatermarkSummary};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Where and how to probe.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub bronze_dataset: String,
    pub watermark_column: String,
    /// Run a total row count before the watermark aggregate.
    pub check_empty_first: bool,
    pub timeout: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self::from(&ScanConfig::default())
    }
}

impl From<&ScanConfig> for ProbeSettings {
    fn from(config: &ScanConfig) -> Self {
        Self {
            bronze_dataset: config.bronze_dataset.clone(),
            watermark_column: config.watermark_column.clone(),
            check_empty_first: config.check_empty_first,
            timeout: Duration::from_secs(config.probe_timeout_secs),
        }
    }
}

/// One cell to probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub tenant_id: TenantId,
    pub storage_ref: String,
    pub table: String,
}

/// Probes bronze tables through a shared warehouse handle.
#[derive(Debug)]
pub struct StorageProbe<W> {
    warehouse: Arc<W>,
    settings: Arc<ProbeSettings>,
}

impl<W> Clone for StorageProbe<W> {
    fn clone(&self) -> Self {
        Self {
            warehouse: Arc::clone(&self.warehouse),
            settings: Arc::clone(&self.settings),
        }
    }
}

impl<W: Warehouse> StorageProbe<W> {
    #[must_use]
    pub fn new(warehouse: Arc<W>, settings: ProbeSettings) -> Self {
        Self {
            warehouse,
            settings: Arc::new(settings),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    /// Probe `{storage_ref}.{bronze_dataset}.{table}`.
    pub async fn probe(&self, tenant_id: TenantId, storage_ref: &str, table: &str) -> ProbeResult {
        let target = TableRef::new(storage_ref, &self.settings.bronze_dataset, table);
        let status = match tokio::time::timeout(self.settings.timeout, self.status(&target)).await {
            Ok(status) => status,
            Err(_) => ProbeStatus::AccessOrOtherError {
                reason: format!("probe timed out after {:?}", self.settings.timeout),
            },
        };

        if let ProbeStatus::Found {
            watermark,
            row_count,
        } = &status
        {
            tracing::trace!(
                tenant = %tenant_id,
                %target,
                zoned = watermark.is_zoned(),
                row_count = *row_count,
                "probe found watermark"
            );
        } else {
            tracing::debug!(tenant = %tenant_id, %target, status = %status, "probe without data");
        }
        ProbeResult::new(tenant_id, table, status)
    }

    async fn status(&self, target: &TableRef) -> ProbeStatus {
        match self.warehouse.table_exists(target).await {
            Ok(true) => {}
            Ok(false) => return ProbeStatus::TableNotFound,
            Err(e) => return status_from_error(e),
        }

        if self.settings.check_empty_first {
            match self.warehouse.row_count(target).await {
                Ok(0) => return ProbeStatus::EmptyTable,
                Ok(_) => {}
                Err(e) => tracing::debug!(%target, error = %e, "row count check failed, continuing"),
            }
        }

        let column = &self.settings.watermark_column;
        match self.warehouse.watermark_summary(target, column).await {
            Ok(WatermarkSummary {
                max: Some(watermark),
                count,
            }) => ProbeStatus::Found {
                watermark,
                row_count: count,
            },
            Ok(WatermarkSummary { max: None, .. }) => ProbeStatus::EmptyTable,
            Err(e) => match self.warehouse.column_exists(target, column).await {
                Ok(false) => ProbeStatus::SchemaMissingColumn,
                Ok(true) | Err(_) => status_from_error(e),
            },
        }
    }

    /// Probe every target with at most `concurrency` probes in flight.
    ///
    /// Results come back in target order.
    pub async fn probe_all(&self, targets: Vec<ProbeTarget>, concurrency: usize) -> Vec<ProbeResult> {
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut set = JoinSet::new();
        let mut results: Vec<Option<ProbeResult>> = vec![None; targets.len()];

        for (idx, target) in targets.iter().cloned().enumerate() {
            let probe = self.clone();
            let sem = Arc::clone(&semaphore);
            set.spawn(async move {
                let _permit = sem.acquire_owned().await;
                let result = probe
                    .probe(target.tenant_id, &target.storage_ref, &target.table)
                    .await;
                (idx, result)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, result)) => results[idx] = Some(result),
                Err(e) => tracing::warn!(error = %e, "probe task failed"),
            }
        }

        results
            .into_iter()
            .zip(targets)
            .map(|(result, target)| {
                result.unwrap_or_else(|| {
                    ProbeResult::new(
                        target.tenant_id,
                        &target.table,
                        ProbeStatus::AccessOrOtherError {
                            reason: "probe task aborted".into(),
                        },
                    )
                })
            })
            .collect()
    }
}

fn status_from_error(error: WarehouseError) -> ProbeStatus {
    match error {
        WarehouseError::NotFound(_) => ProbeStatus::TableNotFound,
        WarehouseError::MissingColumn(_) => ProbeStatus::SchemaMissingColumn,
        other => ProbeStatus::AccessOrOtherError {
            reason: other.to_string(),
        },
    }
}
