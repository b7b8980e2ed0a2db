use anyhow::Context;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output;

/// Handle `swatch tenants`.
pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let resolver = ctx.resolver()?;
    let tenants = resolver
        .resolve_tenants()
        .await
        .with_context(|| format!("failed to resolve tenants from {}", resolver.registry()))?;

    output::output(&tenants, flags.format)
}
