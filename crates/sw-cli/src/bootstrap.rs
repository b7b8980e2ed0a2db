use anyhow::Context;
use sw_config::SwConfig;

use crate::cli::GlobalFlags;

/// Load `.env` and the layered config, then apply flag overrides.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<SwConfig> {
    let mut config = SwConfig::load_with_dotenv(flags.config.as_deref()).with_context(|| {
        flags.config.as_deref().map_or_else(
            || "failed to load syncwatch configuration".to_string(),
            |path| format!("failed to load syncwatch configuration with {}", path.display()),
        )
    })?;

    if let Some(env) = &flags.env {
        config.active_environment.clone_from(env);
        config
            .active()
            .with_context(|| format!("invalid --env '{env}'"))?;
    }

    tracing::debug!(
        environment = config.active_environment.as_str(),
        database = config.warehouse.database.as_str(),
        "configuration loaded"
    );
    Ok(config)
}
