//! Deployment environments and their tenant registries.

use serde::{Deserialize, Serialize};
use sw_core::TableRef;

fn default_registry_dataset() -> String {
    String::from("settings")
}

fn default_registry_table() -> String {
    String::from("companies")
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EnvironmentConfig {
    /// Short name used on the command line (`dev`, `qua`, `pro`).
    pub name: String,

    /// Warehouse project holding this environment's tenant registry.
    pub project_id: String,

    #[serde(default = "default_registry_dataset")]
    pub registry_dataset: String,

    #[serde(default = "default_registry_table")]
    pub registry_table: String,
}

impl EnvironmentConfig {
    #[must_use]
    pub fn new(name: &str, project_id: &str) -> Self {
        Self {
            name: name.to_string(),
            project_id: project_id.to_string(),
            registry_dataset: default_registry_dataset(),
            registry_table: default_registry_table(),
        }
    }

    /// Location of the tenant registry table.
    #[must_use]
    pub fn registry_ref(&self) -> TableRef {
        TableRef::new(&self.project_id, &self.registry_dataset, &self.registry_table)
    }
}

/// Built-in environments, in reconciliation priority order.
#[must_use]
pub fn default_environments() -> Vec<EnvironmentConfig> {
    vec![
        EnvironmentConfig::new("dev", "platform-partners-des"),
        EnvironmentConfig::new("qua", "platform-partners-qua"),
        EnvironmentConfig::new("pro", "constant-height-455614-i0"),
    ]
}
