//! Reconciliation: persist probe results into the consolidated store.
//!
//! Merges are update-only. A result whose (tenant, table) key is absent from
//! the store writes nothing and is counted as unmatched. Merge failures are
//! logged and counted; they never stop the run.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use sw_config::SwConfig;
use sw_core::{ConsolidatedUpdate, MergeOutcome, NullWritePolicy, ProbeResult, TableRef, TenantId};
use sw_warehouse::{RetryConfig, Warehouse, WarehouseError, with_retry};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::EngineError;
use crate::locator::TenantLocator;
use crate::probe::{ProbeTarget, StorageProbe};
use crate::resolver::MetadataResolver;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    /// Existing records overwritten.
    pub updated: usize,
    /// Results whose key is not in the store.
    pub unmatched: usize,
    /// Results not merged because of the null-write policy.
    pub skipped: usize,
    /// Merges that failed after retries.
    pub errors: usize,
    /// Pairs whose tenant could not be located (batch job only).
    pub unresolved: usize,
}

impl ReconcileSummary {
    #[must_use]
    pub const fn attempted(&self) -> usize {
        self.updated + self.unmatched + self.errors
    }
}

/// Writes probe results to the consolidated store.
pub struct Reconciler<W> {
    warehouse: Arc<W>,
    store: TableRef,
    policy: NullWritePolicy,
    concurrency: usize,
    retry: RetryConfig,
}

impl<W: Warehouse> Reconciler<W> {
    #[must_use]
    pub fn new(warehouse: Arc<W>, store: TableRef) -> Self {
        Self {
            warehouse,
            store,
            policy: NullWritePolicy::default(),
            concurrency: 4,
            retry: RetryConfig::default(),
        }
    }

    #[must_use]
    pub fn from_config(warehouse: Arc<W>, config: &SwConfig) -> Self {
        Self::new(warehouse, config.central.consolidated_table.clone())
            .with_policy(config.reconcile.null_write_policy)
            .with_concurrency(config.reconcile.concurrency)
            .with_retry(RetryConfig::from(&config.reconcile))
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: NullWritePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub const fn policy(&self) -> NullWritePolicy {
        self.policy
    }

    #[must_use]
    pub const fn store(&self) -> &TableRef {
        &self.store
    }

    /// Merge every result, at most `concurrency` merges in flight.
    pub async fn reconcile(&self, results: &[ProbeResult]) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut set = JoinSet::new();

        for result in results {
            let Some(update) = ConsolidatedUpdate::from_probe(result, self.policy, Utc::now()) else {
                tracing::debug!(
                    tenant = %result.tenant_id,
                    table = result.table.as_str(),
                    status = %result.status,
                    "preserving existing record"
                );
                summary.skipped += 1;
                continue;
            };

            let warehouse = Arc::clone(&self.warehouse);
            let store = self.store.clone();
            let retry = self.retry.clone();
            let sem = Arc::clone(&semaphore);
            set.spawn(async move {
                let _permit = sem.acquire_owned().await;
                let outcome = with_retry(&retry, "merge_consolidated", || {
                    warehouse.merge_consolidated(&store, &update)
                })
                .await;
                (update.company_id, update.table_name, outcome)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((tenant, table, outcome)) => tally(&mut summary, tenant, &table, outcome),
                Err(e) => {
                    tracing::error!(error = %e, "merge task failed");
                    summary.errors += 1;
                }
            }
        }

        tracing::info!(
            store = %self.store,
            updated = summary.updated,
            unmatched = summary.unmatched,
            skipped = summary.skipped,
            errors = summary.errors,
            "reconciliation finished"
        );
        summary
    }
}

fn tally(
    summary: &mut ReconcileSummary,
    tenant: TenantId,
    table: &str,
    outcome: Result<MergeOutcome, WarehouseError>,
) {
    match outcome {
        Ok(MergeOutcome::Updated) => {
            tracing::debug!(%tenant, table, "record updated");
            summary.updated += 1;
        }
        Ok(MergeOutcome::NoMatch) => {
            tracing::debug!(%tenant, table, "no consolidated record, nothing written");
            summary.unmatched += 1;
        }
        Err(e) => {
            tracing::error!(%tenant, table, error = %e, "merge failed");
            summary.errors += 1;
        }
    }
}

/// Outcome of the batch job.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub summary: ReconcileSummary,
    /// Probe results of every located pair, in pair order.
    pub results: Vec<ProbeResult>,
    /// Pairs whose tenant could not be located.
    pub unresolved: Vec<(TenantId, String)>,
    pub dry_run: bool,
}

/// The batch reconciliation job.
///
/// Resolves monitored tables, lists the (tenant, table) pairs present in the
/// consolidated store for them, locates each tenant, probes each pair and
/// merges the results.
pub struct ReconciliationJob<W, L> {
    resolver: MetadataResolver<W>,
    locator: L,
    probe: StorageProbe<W>,
    reconciler: Reconciler<W>,
    max_tables: usize,
    probe_concurrency: usize,
    dry_run: bool,
}

impl<W: Warehouse, L: TenantLocator> ReconciliationJob<W, L> {
    #[must_use]
    pub const fn new(
        resolver: MetadataResolver<W>,
        locator: L,
        probe: StorageProbe<W>,
        reconciler: Reconciler<W>,
        max_tables: usize,
    ) -> Self {
        Self {
            resolver,
            locator,
            probe,
            reconciler,
            max_tables,
            probe_concurrency: 8,
            dry_run: false,
        }
    }

    #[must_use]
    pub fn with_probe_concurrency(mut self, concurrency: usize) -> Self {
        self.probe_concurrency = concurrency.max(1);
        self
    }

    /// Probe and report without writing.
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run the whole job.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Resolve`] if the monitored tables cannot be
    /// resolved and [`EngineError::PairListing`] if the consolidated store
    /// cannot be read. Per-pair failures are counted in the summary.
    pub async fn run_reconciliation(&self) -> Result<ReconcileReport, EngineError> {
        let selection = self.resolver.resolve_monitored_tables(self.max_tables).await?;
        let tables = selection.names();
        tracing::info!(tables = tables.len(), "monitored tables resolved");

        let store = self.reconciler.store();
        let pairs = self
            .warehouse()
            .consolidated_pairs(store, &tables)
            .await
            .map_err(|source| EngineError::PairListing {
                store: store.to_string(),
                source,
            })?;
        if pairs.is_empty() {
            tracing::warn!(%store, "no consolidated pairs for the monitored tables");
        }

        let ids: Vec<TenantId> = pairs
            .iter()
            .map(|(id, _)| *id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let locations = self.locator.locate(&ids).await;

        let mut targets = Vec::with_capacity(pairs.len());
        let mut unresolved = Vec::new();
        for (tenant_id, table) in pairs {
            match locations.get(&tenant_id) {
                Some(storage_ref) => targets.push(ProbeTarget {
                    tenant_id,
                    storage_ref: storage_ref.clone(),
                    table,
                }),
                None => {
                    tracing::warn!(
                        tenant = %tenant_id,
                        table = table.as_str(),
                        "tenant location unknown, skipping pair"
                    );
                    unresolved.push((tenant_id, table));
                }
            }
        }

        tracing::info!(
            pairs = targets.len(),
            unresolved = unresolved.len(),
            "probing consolidated pairs"
        );
        let results = self.probe.probe_all(targets, self.probe_concurrency).await;

        let mut summary = if self.dry_run {
            let skipped = results
                .iter()
                .filter(|r| {
                    ConsolidatedUpdate::from_probe(r, self.reconciler.policy(), Utc::now()).is_none()
                })
                .count();
            ReconcileSummary {
                skipped,
                ..ReconcileSummary::default()
            }
        } else {
            self.reconciler.reconcile(&results).await
        };
        summary.unresolved = unresolved.len();

        Ok(ReconcileReport {
            summary,
            results,
            unresolved,
            dry_run: self.dry_run,
        })
    }

    fn warehouse(&self) -> &W {
        &self.reconciler.warehouse
    }
}
