use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use sw_core::{NullWritePolicy, TenantId};
use sw_engine::{PriorityLocator, ReconcileReport, ReconcileSummary, Reconciler, ReconciliationJob};

use crate::cli::{GlobalFlags, OutputFormat, ReconcileArgs};
use crate::context::AppContext;
use crate::output;
use crate::progress::Progress;

#[derive(Debug, Serialize)]
struct ReconcileView<'a> {
    store: String,
    null_write_policy: NullWritePolicy,
    dry_run: bool,
    #[serde(flatten)]
    summary: &'a ReconcileSummary,
    probed: usize,
}

/// Handle `swatch reconcile`.
pub async fn handle(
    args: &ReconcileArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let config = &ctx.config;
    let warehouse = Arc::clone(&ctx.warehouse);

    let mut reconciler = Reconciler::from_config(Arc::clone(&warehouse), config);
    if let Some(policy) = args.null_policy {
        reconciler = reconciler.with_policy(NullWritePolicy::from(policy));
    }
    let policy = reconciler.policy();
    let store = reconciler.store().to_string();

    let job = ReconciliationJob::new(
        ctx.resolver()?,
        PriorityLocator::from_config(Arc::clone(&warehouse), config),
        ctx.probe(),
        reconciler,
        config.central.max_tables,
    )
    .with_probe_concurrency(config.scan.concurrency)
    .dry_run(args.dry_run);

    let spinner = Progress::spinner(if args.dry_run {
        "probing consolidated pairs (dry run)"
    } else {
        "reconciling consolidated pairs"
    });
    let report = job.run_reconciliation().await;
    spinner.finish_clear();
    let report = report.with_context(|| format!("reconciliation of {store} failed"))?;

    tracing::info!(
        updated = report.summary.updated,
        unmatched = report.summary.unmatched,
        skipped = report.summary.skipped,
        errors = report.summary.errors,
        unresolved = report.summary.unresolved,
        "reconciliation finished"
    );

    if flags.format == OutputFormat::Table {
        print_table(&report, store, policy, flags)
    } else {
        output::output(&report, flags.format)
    }
}

fn print_table(
    report: &ReconcileReport,
    store: String,
    policy: NullWritePolicy,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let view = ReconcileView {
        store,
        null_write_policy: policy,
        dry_run: report.dry_run,
        summary: &report.summary,
        probed: report.results.len(),
    };
    output::output(&view, flags.format)?;

    if !report.unresolved.is_empty() && !flags.quiet {
        eprintln!("{}", unresolved_note(&report.unresolved));
    }
    Ok(())
}

fn unresolved_note(unresolved: &[(TenantId, String)]) -> String {
    let pairs = unresolved
        .iter()
        .map(|(tenant, table)| format!("{tenant}/{table}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "note: {} pairs skipped because their tenant is in no configured environment: {pairs}",
        unresolved.len()
    )
}
