use anyhow::Context;

use crate::cli::{GlobalFlags, OutputFormat};
use crate::context::AppContext;
use crate::output;

/// Handle `swatch tables`.
pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let limit = ctx.config.central.max_tables;
    let selection = ctx
        .resolver()?
        .resolve_monitored_tables(limit)
        .await
        .context("failed to resolve monitored tables")?;

    if flags.format == OutputFormat::Table {
        output::output(&selection.tables, flags.format)?;
        if selection.is_truncated() && !flags.quiet {
            eprintln!(
                "note: {} more eligible tables beyond the first {limit} were left out: {}",
                selection.dropped.len(),
                selection.dropped.join(", ")
            );
        }
        return Ok(());
    }

    output::output(&selection, flags.format)
}
