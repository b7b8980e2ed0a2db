//! Probe outcomes.
//!
//! Tenants are provisioned independently, so a missing table or a denied
//! permission is a routine outcome. Every probe resolves to exactly one of
//! the statuses below; only [`ProbeStatus::Found`] carries a payload.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tenant::TenantId;
use crate::watermark::Watermark;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeStatus {
    /// The table exists and has rows with a non-null watermark.
    Found { watermark: Watermark, row_count: u64 },
    /// The table exists but has no rows with a non-null watermark.
    EmptyTable,
    /// The table does not exist in the tenant's bronze dataset.
    TableNotFound,
    /// The table exists but lacks the watermark column.
    SchemaMissingColumn,
    /// Permission denial, timeout, transient or unclassified failure.
    AccessOrOtherError { reason: String },
}

impl ProbeStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Found { .. } => "found",
            Self::EmptyTable => "empty_table",
            Self::TableNotFound => "table_not_found",
            Self::SchemaMissingColumn => "schema_missing_column",
            Self::AccessOrOtherError { .. } => "access_or_other_error",
        }
    }

    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    /// Human readable cause for a non-found status.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Found { .. } => "found".to_string(),
            Self::EmptyTable => "table has no rows with a watermark".to_string(),
            Self::TableNotFound => "table does not exist".to_string(),
            Self::SchemaMissingColumn => "watermark column is missing".to_string(),
            Self::AccessOrOtherError { reason } => format!("query failed: {reason}"),
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of probing one (tenant, table) pair. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub tenant_id: TenantId,
    pub table: String,
    #[serde(flatten)]
    pub status: ProbeStatus,
}

impl ProbeResult {
    #[must_use]
    pub fn new(tenant_id: TenantId, table: &str, status: ProbeStatus) -> Self {
        Self {
            tenant_id,
            table: table.to_string(),
            status,
        }
    }

    #[must_use]
    pub fn found(tenant_id: TenantId, table: &str, watermark: Watermark, row_count: u64) -> Self {
        Self::new(
            tenant_id,
            table,
            ProbeStatus::Found {
                watermark,
                row_count,
            },
        )
    }

    /// Watermark, present only for [`ProbeStatus::Found`].
    #[must_use]
    pub const fn watermark(&self) -> Option<&Watermark> {
        match &self.status {
            ProbeStatus::Found { watermark, .. } => Some(watermark),
            _ => None,
        }
    }

    /// Row count, present only for [`ProbeStatus::Found`].
    #[must_use]
    pub const fn row_count(&self) -> Option<u64> {
        match &self.status {
            ProbeStatus::Found { row_count, .. } => Some(*row_count),
            _ => None,
        }
    }
}
