//! Reconciliation (consolidated-store merge) settings.

use serde::{Deserialize, Serialize};
use sw_core::NullWritePolicy;

const fn default_concurrency() -> usize {
    4
}

const fn default_retry_attempts() -> u32 {
    3
}

const fn default_retry_base_delay_ms() -> u64 {
    200
}

const fn default_retry_max_delay_ms() -> u64 {
    2_000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReconcileConfig {
    /// Maximum number of probes/merges in flight.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default)]
    pub null_write_policy: NullWritePolicy,

    /// Attempts per merge (including the first) on transient failures.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            null_write_policy: NullWritePolicy::default(),
            retry_attempts: default_retry_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}
