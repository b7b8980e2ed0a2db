//! Central metadata and consolidated-store locations.

use serde::{Deserialize, Serialize};
use sw_core::TableRef;

/// Default cap on the number of monitored tables.
const fn default_max_tables() -> usize {
    11
}

fn default_metadata_table() -> TableRef {
    TableRef::new("pph-central", "management", "metadata_consolidated_tables")
}

fn default_consolidated_table() -> TableRef {
    TableRef::new("pph-central", "settings", "companies_consolidated")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CentralConfig {
    /// Table listing the replicated tables and their flags.
    #[serde(default = "default_metadata_table")]
    pub metadata_table: TableRef,

    /// Consolidated per-(tenant, table) freshness records.
    #[serde(default = "default_consolidated_table")]
    pub consolidated_table: TableRef,

    /// Maximum number of monitored tables per scan.
    #[serde(default = "default_max_tables")]
    pub max_tables: usize,
}

impl Default for CentralConfig {
    fn default() -> Self {
        Self {
            metadata_table: default_metadata_table(),
            consolidated_table: default_consolidated_table(),
            max_tables: default_max_tables(),
        }
    }
}
