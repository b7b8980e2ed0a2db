use crate::cli::{Commands, GlobalFlags};
use crate::context::AppContext;

/// Route a parsed command to its handler.
pub async fn dispatch(
    command: Commands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Scan(args) => super::scan::handle(&args, ctx, flags).await,
        Commands::Reconcile(args) => super::reconcile::handle(&args, ctx, flags).await,
        Commands::Tables => super::tables::handle(ctx, flags).await,
        Commands::Tenants => super::tenants::handle(ctx, flags).await,
    }
}
