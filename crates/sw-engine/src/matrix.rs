//! Matrix builder: probes the tenant x table cross product.
//!
//! Every pair is probed exactly once through a semaphore-bounded `JoinSet`.
//! Results land in the pre-sized slot of their pair, so the matrix does not
//! depend on completion order. A deadline or a cancellation token stops the
//! scan early; abandoned slots stay empty and show up in
//! [`SyncMatrix::missing`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use sw_config::ScanConfig;
use sw_core::{Orientation, ProbeResult, ProbeStatus, SyncMatrix, Tenant};
use sw_warehouse::Warehouse;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::probe::StorageProbe;

/// Observer for scan progress.
///
/// Called from the collecting task only; `completed` increases by one per
/// call to [`ScanProgress::on_cell`].
pub trait ScanProgress: Send + Sync {
    fn on_start(&self, _total: usize) {}
    fn on_cell(&self, _completed: usize, _total: usize, _result: &ProbeResult) {}
    fn on_finish(&self, _completed: usize, _total: usize) {}
}

/// Progress observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ScanProgress for NoProgress {}

/// Why a scan stopped before every cell was probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Cancelled,
    DeadlineExceeded,
}

/// A built matrix plus how the scan ended.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub matrix: SyncMatrix,
    pub orientation: Orientation,
    pub stopped: Option<StopReason>,
}

impl ScanOutcome {
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        self.stopped.is_some()
    }
}

pub struct MatrixBuilder<W> {
    probe: StorageProbe<W>,
    concurrency: usize,
    orientation: Orientation,
    deadline: Option<Duration>,
    cancel: CancellationToken,
}

impl<W: Warehouse> MatrixBuilder<W> {
    #[must_use]
    pub fn new(probe: StorageProbe<W>) -> Self {
        Self {
            probe,
            concurrency: 8,
            orientation: Orientation::default(),
            deadline: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Builder with concurrency, orientation and deadline from `config`.
    #[must_use]
    pub fn from_config(probe: StorageProbe<W>, config: &ScanConfig) -> Self {
        Self::new(probe)
            .with_concurrency(config.concurrency)
            .with_orientation(config.orientation)
            .with_deadline(config.scan_timeout_secs.map(Duration::from_secs))
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub const fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    #[must_use]
    pub const fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Probe every (tenant, table) pair.
    pub async fn build(
        &self,
        tenants: Vec<Tenant>,
        tables: Vec<String>,
        progress: &dyn ScanProgress,
    ) -> ScanOutcome {
        let mut matrix = SyncMatrix::new(tenants, tables);
        let order = matrix.cell_order(self.orientation);
        let total = order.len();
        progress.on_start(total);

        let settings = self.probe.settings();
        tracing::info!(
            cells = total,
            concurrency = self.concurrency,
            orientation = %self.orientation,
            dataset = settings.bronze_dataset.as_str(),
            column = settings.watermark_column.as_str(),
            "matrix scan started"
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut set = JoinSet::new();
        let mut slots = HashMap::with_capacity(total);

        // Dispatch order is best effort: tasks queue for permits in the order
        // they are first polled. Only presentation depends on `order`.
        for (t, k) in order {
            let tenant = &matrix.tenants()[t];
            let tenant_id = tenant.id;
            let storage_ref = tenant.storage_ref.clone();
            let table = matrix.tables()[k].clone();
            let probe = self.probe.clone();
            let sem = Arc::clone(&semaphore);

            let handle = set.spawn(async move {
                let _permit = sem.acquire_owned().await;
                let result = probe.probe(tenant_id, &storage_ref, &table).await;
                (t, k, result)
            });
            slots.insert(handle.id(), (t, k));
        }

        let deadline = async {
            match self.deadline {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);

        let mut completed = 0;
        let stopped = loop {
            let joined = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break Some(StopReason::Cancelled),
                () = &mut deadline => break Some(StopReason::DeadlineExceeded),
                joined = set.join_next_with_id() => joined,
            };

            let (t, k, result) = match joined {
                None => break None,
                Some(Ok((id, cell))) => {
                    slots.remove(&id);
                    cell
                }
                Some(Err(e)) => {
                    let Some((t, k)) = slots.remove(&e.id()) else {
                        continue;
                    };
                    let tenant_id = matrix.tenants()[t].id;
                    let table = matrix.tables()[k].clone();
                    tracing::error!(
                        tenant = %tenant_id,
                        table = table.as_str(),
                        error = %e,
                        "probe task failed"
                    );
                    let status = ProbeStatus::AccessOrOtherError {
                        reason: format!("probe task failed: {e}"),
                    };
                    (t, k, ProbeResult::new(tenant_id, &table, status))
                }
            };

            completed += 1;
            progress.on_cell(completed, total, &result);
            if let Err(e) = matrix.insert(t, k, result) {
                tracing::warn!(error = %e, "discarding probe result");
            }
        };

        if let Some(reason) = stopped {
            set.abort_all();
            tracing::warn!(
                ?reason,
                completed,
                total,
                "scan stopped early, unprobed cells left empty"
            );
        }
        progress.on_finish(completed, total);

        ScanOutcome {
            matrix,
            orientation: self.orientation,
            stopped,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Local;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use sw_core::TenantId;

    use super::*;
    use crate::fake::{Fault, FakeTable, FakeWarehouse};
    use crate::probe::ProbeSettings;

    const RECENT: &str = "2024-06-01T10:00:00Z";

    fn tenants() -> Vec<Tenant> {
        vec![
            Tenant::new(1, "Acme", "acme"),
            Tenant::new(2, "Beta", "beta"),
            Tenant::new(3, "Gamma", "gamma"),
        ]
    }

    fn tables() -> Vec<String> {
        vec!["customers".into(), "invoices".into(), "jobs".into()]
    }

    fn builder(wh: FakeWarehouse) -> MatrixBuilder<FakeWarehouse> {
        let settings = ProbeSettings {
            timeout: Duration::from_millis(500),
            ..ProbeSettings::default()
        };
        MatrixBuilder::new(StorageProbe::new(Arc::new(wh), settings)).with_concurrency(4)
    }

    /// Every kind of failure in one warehouse.
    fn hostile_warehouse() -> FakeWarehouse {
        FakeWarehouse::new()
            .with_table("acme", "customers", FakeTable::synced(RECENT, 10))
            .with_table("acme", "invoices", FakeTable::empty())
            .with_table("acme", "jobs", FakeTable::without_watermark_column(3))
            .with_table("beta", "customers", FakeTable::synced(RECENT, 1))
            .with_fault("beta", "invoices", Fault::Denied)
            .with_table("beta", "invoices", FakeTable::synced(RECENT, 1))
            .with_fault("beta", "jobs", Fault::Panic)
            .with_table("gamma", "customers", FakeTable::synced(RECENT, 7))
            .with_fault("gamma", "invoices", Fault::Hang)
            .with_table("gamma", "invoices", FakeTable::synced(RECENT, 7))
    }

    #[derive(Default)]
    struct Recorder {
        start: Mutex<usize>,
        seen: Mutex<Vec<usize>>,
    }

    impl ScanProgress for Recorder {
        fn on_start(&self, total: usize) {
            *self.start.lock().unwrap() = total;
        }
        fn on_cell(&self, completed: usize, _total: usize, _result: &ProbeResult) {
            self.seen.lock().unwrap().push(completed);
        }
    }

    #[rstest]
    #[case(Orientation::TenantMajor)]
    #[case(Orientation::TableMajor)]
    #[tokio::test]
    async fn every_cell_filled_despite_failures(#[case] orientation: Orientation) {
        let outcome = builder(hostile_warehouse())
            .with_orientation(orientation)
            .build(tenants(), tables(), &NoProgress)
            .await;

        assert_eq!(outcome.stopped, None);
        assert!(outcome.matrix.is_complete());
        assert_eq!(outcome.matrix.results().count(), 9);

        let status = |id: i64, table: &str| {
            outcome
                .matrix
                .get(TenantId(id), table)
                .map(|r| r.status.as_str())
                .unwrap()
        };
        assert_eq!(status(1, "customers"), "found");
        assert_eq!(status(1, "invoices"), "empty_table");
        assert_eq!(status(1, "jobs"), "schema_missing_column");
        assert_eq!(status(2, "invoices"), "access_or_other_error");
        assert_eq!(status(2, "jobs"), "access_or_other_error");
        assert_eq!(status(3, "invoices"), "access_or_other_error");
        assert_eq!(status(3, "jobs"), "table_not_found");
    }

    #[tokio::test]
    async fn orientation_does_not_change_results() {
        let a = builder(hostile_warehouse())
            .build(tenants(), tables(), &NoProgress)
            .await;
        let b = builder(hostile_warehouse())
            .with_orientation(Orientation::TableMajor)
            .build(tenants(), tables(), &NoProgress)
            .await;

        let statuses = |m: &SyncMatrix| -> Vec<String> {
            m.results()
                .map(|r| format!("{}:{}:{}", r.tenant_id, r.table, r.status))
                .collect()
        };
        assert_eq!(statuses(&a.matrix), statuses(&b.matrix));
    }

    #[tokio::test]
    async fn progress_is_monotonic() {
        let recorder = Recorder::default();
        builder(hostile_warehouse())
            .build(tenants(), tables(), &recorder)
            .await;

        assert_eq!(*recorder.start.lock().unwrap(), 9);
        assert_eq!(*recorder.seen.lock().unwrap(), (1..=9).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn deadline_leaves_unprobed_cells_missing() {
        let wh = FakeWarehouse::new()
            .with_table("acme", "customers", FakeTable::synced(RECENT, 1))
            .with_fault("beta", "jobs", Fault::Hang);
        let settings = ProbeSettings {
            timeout: Duration::from_secs(60),
            ..ProbeSettings::default()
        };
        let outcome = MatrixBuilder::new(StorageProbe::new(Arc::new(wh), settings))
            .with_deadline(Some(Duration::from_millis(300)))
            .build(tenants(), tables(), &NoProgress)
            .await;

        assert_eq!(outcome.stopped, Some(StopReason::DeadlineExceeded));
        assert!(outcome.is_partial());
        assert_eq!(outcome.matrix.missing(), vec![(TenantId(2), "jobs")]);
        assert_eq!(outcome.matrix.filled_cells(), 8);

        let stats = outcome.matrix.stats(Local::now());
        assert_eq!(stats.unprobed, 1);
        assert_eq!(stats.synced, 1);
    }

    #[tokio::test]
    async fn cancelled_before_start_probes_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = builder(hostile_warehouse())
            .with_cancellation(cancel)
            .build(tenants(), tables(), &NoProgress)
            .await;

        assert_eq!(outcome.stopped, Some(StopReason::Cancelled));
        assert_eq!(outcome.matrix.filled_cells(), 0);
        assert_eq!(outcome.matrix.missing().len(), 9);
    }

    #[tokio::test]
    async fn cancel_mid_scan_keeps_finished_cells() {
        let wh = FakeWarehouse::new()
            .with_table("acme", "customers", FakeTable::synced(RECENT, 1))
            .with_fault("gamma", "jobs", Fault::Hang);
        let settings = ProbeSettings {
            timeout: Duration::from_secs(60),
            ..ProbeSettings::default()
        };
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let outcome = MatrixBuilder::new(StorageProbe::new(Arc::new(wh), settings))
            .with_cancellation(cancel)
            .build(tenants(), tables(), &NoProgress)
            .await;

        assert_eq!(outcome.stopped, Some(StopReason::Cancelled));
        assert_eq!(outcome.matrix.missing(), vec![(TenantId(3), "jobs")]);
    }

    #[tokio::test]
    async fn empty_universe_builds_empty_matrix() {
        let outcome = builder(FakeWarehouse::new())
            .build(Vec::new(), tables(), &NoProgress)
            .await;
        assert_eq!(outcome.matrix.total_cells(), 0);
        assert!(outcome.matrix.is_complete());
    }
}
