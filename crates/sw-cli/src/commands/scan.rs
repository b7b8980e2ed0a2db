use std::time::Duration;

use anyhow::Context;
use sw_core::Orientation;
use sw_engine::MatrixBuilder;
use tokio_util::sync::CancellationToken;

use crate::cli::{GlobalFlags, ScanArgs};
use crate::context::AppContext;
use crate::output;
use crate::progress::Progress;

/// Handle `swatch scan`.
pub async fn handle(args: &ScanArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let resolver = ctx.resolver()?;
    let spinner = Progress::spinner("resolving tenants and tables");
    let tenants = resolver.resolve_tenants().await;
    let tables = resolver
        .resolve_monitored_tables(ctx.config.central.max_tables)
        .await;
    spinner.finish_clear();
    let tenants = tenants.context("failed to resolve tenants")?;
    let selection = tables.context("failed to resolve monitored tables")?;

    let mut builder = MatrixBuilder::from_config(ctx.probe(), &ctx.config.scan);
    if let Some(orientation) = args.orientation {
        builder = builder.with_orientation(Orientation::from(orientation));
    }
    if let Some(concurrency) = args.concurrency {
        builder = builder.with_concurrency(concurrency);
    }
    if let Some(secs) = args.timeout {
        builder = builder.with_deadline(Some(Duration::from_secs(secs)));
    }

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, stopping scan");
                cancel.cancel();
            }
        })
    };
    let builder = builder.with_cancellation(cancel);

    tracing::info!(
        tenants = tenants.len(),
        tables = selection.tables.len(),
        "scanning bronze tables"
    );
    let progress = Progress::bar(0, "probing");
    let outcome = builder.build(tenants, selection.names(), &progress).await;
    interrupt.abort();

    let rendered = output::matrix::render_scan(
        &outcome,
        flags.format,
        args.debug,
        chrono::Local::now(),
        output::table_options(),
    )?;
    println!("{rendered}");
    Ok(())
}
