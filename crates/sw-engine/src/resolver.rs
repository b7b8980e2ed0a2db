//! Metadata resolution: which tenants and which tables a scan covers.
//!
//! Both sets are read fresh on every call. Reading either store is fatal on
//! failure, and an empty result is treated the same way, so a scan never
//! runs over an unknown universe.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use sw_config::SwConfig;
use sw_core::{MonitoredTable, TableRef, Tenant};
use sw_warehouse::Warehouse;

use crate::error::{EngineError, ResolveError};

/// Monitored tables after filtering and truncation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSelection {
    /// Tables the scan covers, ordered by name.
    pub tables: Vec<MonitoredTable>,
    /// Eligible tables cut by the limit, ordered by name.
    pub dropped: Vec<String>,
}

impl TableSelection {
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }

    #[must_use]
    pub fn is_truncated(&self) -> bool {
        !self.dropped.is_empty()
    }
}

/// Keep eligible tables, order by name and keep the first `limit`.
#[must_use]
pub fn select_tables(rows: Vec<MonitoredTable>, limit: usize) -> TableSelection {
    let mut eligible: Vec<MonitoredTable> = rows
        .into_iter()
        .filter(MonitoredTable::is_eligible)
        .collect();
    eligible.sort_by(|a, b| a.name.cmp(&b.name));
    eligible.dedup_by(|a, b| a.name == b.name);

    let dropped = if eligible.len() > limit {
        eligible.split_off(limit).into_iter().map(|t| t.name).collect()
    } else {
        Vec::new()
    };

    TableSelection {
        tables: eligible,
        dropped,
    }
}

/// Keep active tenants ordered by display name, ties broken by id.
///
/// A tenant id listed more than once keeps only its first row in that order.
#[must_use]
pub fn select_tenants(rows: Vec<Tenant>) -> Vec<Tenant> {
    let mut active: Vec<Tenant> = rows.into_iter().filter(|t| t.active).collect();
    active.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

    let mut seen = HashSet::with_capacity(active.len());
    active.retain(|tenant| {
        let first = seen.insert(tenant.id);
        if !first {
            tracing::warn!(
                tenant = %tenant.id,
                name = tenant.name.as_str(),
                "duplicate tenant row ignored"
            );
        }
        first
    });
    active
}

/// Reads the tenant registry of one environment and the central metadata.
#[derive(Debug)]
pub struct MetadataResolver<W> {
    warehouse: Arc<W>,
    metadata_table: TableRef,
    registry: TableRef,
}

impl<W: Warehouse> MetadataResolver<W> {
    #[must_use]
    pub const fn new(warehouse: Arc<W>, metadata_table: TableRef, registry: TableRef) -> Self {
        Self {
            warehouse,
            metadata_table,
            registry,
        }
    }

    /// Resolver for the configured active environment.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if the active environment is not configured.
    pub fn from_config(warehouse: Arc<W>, config: &SwConfig) -> Result<Self, EngineError> {
        let environment = config.active()?;
        Ok(Self::new(
            warehouse,
            config.central.metadata_table.clone(),
            environment.registry_ref(),
        ))
    }

    #[must_use]
    pub const fn registry(&self) -> &TableRef {
        &self.registry
    }

    /// Active tenants of the environment, ordered by display name.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Read`] if the registry cannot be read and
    /// [`ResolveError::Empty`] if it has no active tenant.
    pub async fn resolve_tenants(&self) -> Result<Vec<Tenant>, ResolveError> {
        let rows = self
            .warehouse
            .tenant_registry(&self.registry)
            .await
            .map_err(|source| ResolveError::Read {
                what: "tenants",
                source_table: self.registry.to_string(),
                source,
            })?;
        let total = rows.len();
        let tenants = select_tenants(rows);

        tracing::debug!(
            registry = %self.registry,
            total,
            active = tenants.len(),
            "tenants resolved"
        );
        if tenants.is_empty() {
            return Err(ResolveError::Empty {
                what: "active tenants",
                source_table: self.registry.to_string(),
            });
        }
        Ok(tenants)
    }

    /// Eligible monitored tables, ordered by name and capped at `limit`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Read`] if the metadata store cannot be read and
    /// [`ResolveError::Empty`] if no table qualifies.
    pub async fn resolve_monitored_tables(&self, limit: usize) -> Result<TableSelection, ResolveError> {
        let rows = self
            .warehouse
            .monitored_tables(&self.metadata_table)
            .await
            .map_err(|source| ResolveError::Read {
                what: "monitored tables",
                source_table: self.metadata_table.to_string(),
                source,
            })?;
        let selection = select_tables(rows, limit);

        if selection.is_truncated() {
            tracing::warn!(
                limit,
                dropped = selection.dropped.len(),
                first_dropped = %selection.dropped[0],
                "monitored table list truncated"
            );
        }
        if selection.tables.is_empty() {
            return Err(ResolveError::Empty {
                what: "monitored tables",
                source_table: self.metadata_table.to_string(),
            });
        }
        Ok(selection)
    }
}
