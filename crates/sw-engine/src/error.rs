//! Engine error types.
//!
//! Per-cell probe failures and per-pair merge failures are data, not errors;
//! only failures that leave the engine without a known universe surface here.

use sw_config::ConfigError;
use sw_warehouse::WarehouseError;

/// Metadata resolution failed. Always fatal for a scan.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Reading a metadata store failed.
    #[error("failed to read {what} from {source_table}: {source}")]
    Read {
        /// Which set was being resolved (`tenants`, `monitored tables`).
        what: &'static str,
        /// Fully qualified table that was read.
        source_table: String,
        #[source]
        source: WarehouseError,
    },

    /// The store was readable but nothing qualified.
    #[error("no {what} resolved from {source_table}")]
    Empty {
        what: &'static str,
        source_table: String,
    },
}

/// Errors from the batch reconciliation job and engine setup.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Listing (tenant, table) pairs from the consolidated store failed.
    #[error("failed to list consolidated pairs from {store}: {source}")]
    PairListing {
        store: String,
        #[source]
        source: WarehouseError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}
