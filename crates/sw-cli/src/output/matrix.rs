//! Sync matrix rendering.
//!
//! The table format lays the matrix out as a grid (tenants or tables as
//! rows, following the scan orientation), followed by the statistics line.
//! JSON and raw formats emit [`ScanView`].

use std::collections::HashMap;
use std::fmt::Write as _;

use chrono::{DateTime, Local};
use serde::Serialize;
use sw_core::{
    FreshnessBucket, MatrixStats, Orientation, ProbeResult, SyncMatrix, Tenant, TenantId, classify,
};
use sw_engine::{ScanOutcome, StopReason};

use super::table::{self, TableOptions, Tone};
use crate::cli::OutputFormat;

/// Marker for a probed cell without a watermark.
pub const NO_DATA: &str = "-";
/// Marker for a cell the scan never reached.
pub const UNPROBED: &str = "?";

#[derive(Debug, Serialize)]
pub struct ScanView<'a> {
    pub orientation: Orientation,
    pub stopped: Option<StopReason>,
    pub stats: MatrixStats,
    pub tenants: &'a [Tenant],
    pub tables: &'a [String],
    pub cells: Vec<&'a ProbeResult>,
    pub missing: Vec<MissingCell<'a>>,
}

#[derive(Debug, Serialize)]
pub struct MissingCell<'a> {
    pub tenant_id: TenantId,
    pub table: &'a str,
}

impl<'a> ScanView<'a> {
    #[must_use]
    pub fn new(outcome: &'a ScanOutcome, now: DateTime<Local>) -> Self {
        let matrix = &outcome.matrix;
        Self {
            orientation: outcome.orientation,
            stopped: outcome.stopped,
            stats: matrix.stats(now),
            tenants: matrix.tenants(),
            tables: matrix.tables(),
            cells: matrix.results().collect(),
            missing: matrix
                .missing()
                .into_iter()
                .map(|(tenant_id, table)| MissingCell { tenant_id, table })
                .collect(),
        }
    }
}

/// Render a scan outcome in the requested format.
pub fn render_scan(
    outcome: &ScanOutcome,
    format: OutputFormat,
    debug: bool,
    now: DateTime<Local>,
    options: TableOptions,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&ScanView::new(outcome, now))?),
        OutputFormat::Raw => Ok(serde_json::to_string(&ScanView::new(outcome, now))?),
        OutputFormat::Table => Ok(render_scan_table(outcome, debug, now, options)),
    }
}

/// Text and tone of one matrix cell.
#[must_use]
pub fn cell_text(cell: Option<&ProbeResult>, now: DateTime<Local>) -> (String, Tone) {
    let Some(result) = cell else {
        return (UNPROBED.to_string(), Tone::Muted);
    };
    let watermark = result.watermark();
    match classify(watermark, now) {
        FreshnessBucket::NoData => (NO_DATA.to_string(), Tone::Muted),
        bucket => {
            let (pattern, tone) = match bucket {
                FreshnessBucket::Stale => ("%Y-%m-%d", Tone::Bad),
                FreshnessBucket::Aging => ("%m-%d %H:%M", Tone::Warn),
                _ => ("%m-%d %H:%M", Tone::Good),
            };
            let text = watermark.map_or_else(|| NO_DATA.to_string(), |w| w.format(pattern));
            (text, tone)
        }
    }
}

fn tenant_label(tenant: &Tenant) -> String {
    format!("{} ({})", tenant.name, tenant.id)
}

fn grid(
    matrix: &SyncMatrix,
    orientation: Orientation,
    now: DateTime<Local>,
) -> (Vec<String>, Vec<Vec<(String, Tone)>>) {
    let tenants = matrix.tenants();
    let tables = matrix.tables();
    match orientation {
        Orientation::TenantMajor => {
            let headers = std::iter::once("tenant".to_string())
                .chain(tables.iter().cloned())
                .collect();
            let rows = tenants
                .iter()
                .enumerate()
                .map(|(t, tenant)| {
                    std::iter::once((tenant_label(tenant), Tone::Muted))
                        .chain((0..tables.len()).map(|k| cell_text(matrix.cell(t, k), now)))
                        .collect()
                })
                .collect();
            (headers, rows)
        }
        Orientation::TableMajor => {
            let headers = std::iter::once("table".to_string())
                .chain(tenants.iter().map(tenant_label))
                .collect();
            let rows = tables
                .iter()
                .enumerate()
                .map(|(k, name)| {
                    std::iter::once((name.clone(), Tone::Muted))
                        .chain((0..tenants.len()).map(|t| cell_text(matrix.cell(t, k), now)))
                        .collect()
                })
                .collect();
            (headers, rows)
        }
    }
}

fn render_scan_table(
    outcome: &ScanOutcome,
    debug: bool,
    now: DateTime<Local>,
    options: TableOptions,
) -> String {
    let matrix = &outcome.matrix;
    if matrix.total_cells() == 0 {
        return String::from("(no cells)");
    }

    let (headers, toned) = grid(matrix, outcome.orientation, now);
    let header_refs = headers.iter().map(String::as_str).collect::<Vec<_>>();
    let rows = toned
        .iter()
        .map(|row| row.iter().map(|(text, _)| text.clone()).collect())
        .collect::<Vec<Vec<String>>>();
    let mut out = table::render_toned_table(&header_refs, &rows, options, |row, column, _| {
        (column > 0).then(|| toned[row][column].1)
    });

    let stats = matrix.stats(now);
    out.push_str("\n\n");
    out.push_str(&stats_line(&stats));

    if let Some(reason) = outcome.stopped {
        let cause = match reason {
            StopReason::Cancelled => "cancelled",
            StopReason::DeadlineExceeded => "deadline exceeded",
        };
        let _ = write!(out, "\nscan stopped early ({cause}); cells not probed:");
        for (tenant_id, table) in matrix.missing() {
            let _ = write!(out, "\n  {tenant_id} / {table}");
        }
    }

    if debug {
        out.push_str(&failure_report(matrix));
    }
    out
}

#[must_use]
pub fn stats_line(stats: &MatrixStats) -> String {
    let mut line = format!(
        "synced {}/{} cells, {} within the last 24h, {} without data",
        stats.synced, stats.total_cells, stats.synced_recently, stats.missing
    );
    if stats.unprobed > 0 {
        let _ = write!(line, " ({} not probed)", stats.unprobed);
    }
    line
}

fn failure_report(matrix: &SyncMatrix) -> String {
    let names: HashMap<TenantId, &str> = matrix
        .tenants()
        .iter()
        .map(|tenant| (tenant.id, tenant.name.as_str()))
        .collect();

    let mut out = String::from("\ncells without data:");
    let mut any = false;
    for result in matrix.failures() {
        any = true;
        let name = names.get(&result.tenant_id).copied().unwrap_or("?");
        let _ = write!(
            out,
            "\n  {name} ({}) / {}: {}",
            result.tenant_id,
            result.table,
            result.status.describe()
        );
    }
    if !any {
        out.push_str(" none");
    }
    out
}
