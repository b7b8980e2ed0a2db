use std::sync::Arc;

use anyhow::Context;
use sw_config::SwConfig;
use sw_engine::{MetadataResolver, ProbeSettings, StorageProbe};
use sw_warehouse::DuckWarehouse;

/// Shared state for command handlers: the config and one warehouse handle.
pub struct AppContext {
    pub config: SwConfig,
    pub warehouse: Arc<DuckWarehouse>,
}

impl AppContext {
    pub fn init(config: SwConfig) -> anyhow::Result<Self> {
        let warehouse = DuckWarehouse::open(&config.warehouse).with_context(|| {
            format!(
                "failed to open warehouse '{}'",
                if config.warehouse.uses_motherduck() {
                    config.warehouse.motherduck_db.as_str()
                } else {
                    config.warehouse.database.as_str()
                }
            )
        })?;

        Ok(Self {
            config,
            warehouse: Arc::new(warehouse),
        })
    }

    pub fn resolver(&self) -> anyhow::Result<MetadataResolver<DuckWarehouse>> {
        MetadataResolver::from_config(Arc::clone(&self.warehouse), &self.config)
            .context("failed to select the tenant registry")
    }

    #[must_use]
    pub fn probe(&self) -> StorageProbe<DuckWarehouse> {
        StorageProbe::new(
            Arc::clone(&self.warehouse),
            ProbeSettings::from(&self.config.scan),
        )
    }
}
