//! Scan (matrix build) settings.

use serde::{Deserialize, Serialize};
use sw_core::Orientation;

const fn default_concurrency() -> usize {
    8
}

const fn default_probe_timeout_secs() -> u64 {
    30
}

const fn default_check_empty_first() -> bool {
    true
}

fn default_bronze_dataset() -> String {
    String::from("bronze")
}

fn default_watermark_column() -> String {
    String::from("_etl_synced")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Maximum number of probes in flight.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-probe timeout, in seconds.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Whole-scan deadline, in seconds. Unset means no deadline.
    #[serde(default)]
    pub scan_timeout_secs: Option<u64>,

    /// Count rows before aggregating so empty tables short-circuit.
    #[serde(default = "default_check_empty_first")]
    pub check_empty_first: bool,

    /// Dataset holding the replicated tables inside each tenant project.
    #[serde(default = "default_bronze_dataset")]
    pub bronze_dataset: String,

    /// Nullable timestamp column written by the replication pipeline.
    #[serde(default = "default_watermark_column")]
    pub watermark_column: String,

    #[serde(default)]
    pub orientation: Orientation,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            probe_timeout_secs: default_probe_timeout_secs(),
            scan_timeout_secs: None,
            check_empty_first: default_check_empty_first(),
            bronze_dataset: default_bronze_dataset(),
            watermark_column: default_watermark_column(),
            orientation: Orientation::default(),
        }
    }
}
