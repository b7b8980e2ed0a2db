//! Warehouse connection configuration.
//!
//! The warehouse is a DuckDB database (local file or `MotherDuck`) where each
//! storage project is an attached catalog, so `project.dataset.table`
//! resolves as `catalog.schema.table`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default local database path.
fn default_database() -> String {
    String::from("syncwatch.duckdb")
}

/// Default `MotherDuck` database name.
fn default_db_name() -> String {
    String::from("syncwatch")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WarehouseConfig {
    /// Local database path, or `:memory:`.
    #[serde(default = "default_database")]
    pub database: String,

    /// `MotherDuck` access token. When set, the warehouse connects to `MotherDuck`.
    #[serde(default)]
    pub motherduck_token: String,

    /// Database name in `MotherDuck`.
    #[serde(default = "default_db_name")]
    pub motherduck_db: String,

    /// Catalogs to attach, keyed by project id. Values are database paths
    /// (or `md:` URLs).
    #[serde(default)]
    pub attach: BTreeMap<String, String>,

    /// Attach catalogs read-only.
    #[serde(default)]
    pub read_only: bool,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            motherduck_token: String::new(),
            motherduck_db: default_db_name(),
            attach: BTreeMap::new(),
            read_only: false,
        }
    }
}

impl WarehouseConfig {
    #[must_use]
    pub const fn uses_motherduck(&self) -> bool {
        !self.motherduck_token.is_empty()
    }

    /// Connection target passed to DuckDB.
    ///
    /// Format: `md:{db}?motherduck_token={token}` or the local database path.
    #[must_use]
    pub fn connection_string(&self) -> String {
        if self.uses_motherduck() {
            format!(
                "md:{}?motherduck_token={}",
                self.motherduck_db, self.motherduck_token
            )
        } else {
            self.database.clone()
        }
    }
}
