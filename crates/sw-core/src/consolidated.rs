//! Consolidated per-(tenant, table) freshness records.
//!
//! The consolidated store is seeded externally. syncwatch only updates
//! existing keys; a merge against a missing key writes nothing.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::probe::ProbeResult;
use crate::tenant::TenantId;
use crate::watermark::Watermark;

/// A row of the consolidated store as read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedRecord {
    pub company_id: TenantId,
    pub table_name: String,
    pub last_etl_synced: Option<Watermark>,
    pub row_count: Option<u64>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// How non-found probe results are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullWritePolicy {
    /// Write a null watermark and a zero row count.
    #[default]
    Overwrite,
    /// Leave the existing record untouched.
    Preserve,
}

impl NullWritePolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overwrite => "overwrite",
            Self::Preserve => "preserve",
        }
    }
}

impl fmt::Display for NullWritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values written by one update-only merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedUpdate {
    pub company_id: TenantId,
    pub table_name: String,
    pub last_etl_synced: Option<Watermark>,
    pub row_count: u64,
    pub updated_at: DateTime<Utc>,
}

impl ConsolidatedUpdate {
    /// Build the update for a probe result, or `None` when the policy says
    /// the result must not be written.
    #[must_use]
    pub fn from_probe(
        result: &ProbeResult,
        policy: NullWritePolicy,
        updated_at: DateTime<Utc>,
    ) -> Option<Self> {
        if !result.status.is_found() && policy == NullWritePolicy::Preserve {
            return None;
        }

        Some(Self {
            company_id: result.tenant_id,
            table_name: result.table.clone(),
            last_etl_synced: result.watermark().copied(),
            row_count: result.row_count().unwrap_or(0),
            updated_at,
        })
    }
}

/// Result of an update-only merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeOutcome {
    /// An existing record was overwritten.
    Updated,
    /// No record with that key exists; nothing was written.
    NoMatch,
}
