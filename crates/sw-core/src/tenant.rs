//! Tenants and monitored tables.
//!
//! Both are owned by external metadata stores and loaded fresh per scan;
//! nothing in syncwatch mutates them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable tenant ("company") identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub i64);

impl TenantId {
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TenantId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// A customer account with its own isolated storage project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    /// Display name, used for ordering.
    pub name: String,
    /// Opaque reference to the tenant's isolated storage project.
    pub storage_ref: String,
    pub active: bool,
}

impl Tenant {
    #[must_use]
    pub fn new(id: i64, name: &str, storage_ref: &str) -> Self {
        Self {
            id: TenantId(id),
            name: name.to_string(),
            storage_ref: storage_ref.to_string(),
            active: true,
        }
    }
}

/// A replicated source table listed in the central metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredTable {
    pub name: String,
    pub active: bool,
    /// Whether the table participates in the replicated (bronze) layer.
    pub include_in_scan: bool,
}

impl MonitoredTable {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            active: true,
            include_in_scan: true,
        }
    }

    /// Active and flagged for inclusion.
    #[must_use]
    pub const fn is_eligible(&self) -> bool {
        self.active && self.include_in_scan
    }
}
