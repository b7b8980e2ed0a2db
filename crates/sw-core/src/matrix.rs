//! The tenant x table sync matrix.
//!
//! Slots are pre-sized for the full cross product and addressed by
//! `(tenant_index, table_index)`, so the finished matrix is identical no
//! matter in which order probes complete. A slot stays empty only when a
//! scan was cancelled before reaching it.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::freshness::{FreshnessBucket, classify};
use crate::probe::ProbeResult;
use crate::tenant::{Tenant, TenantId};

/// Which axis drives iteration and presentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Tenants are rows, tables are columns.
    #[default]
    TenantMajor,
    /// Tables are rows, tenants are columns.
    TableMajor,
}

impl Orientation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TenantMajor => "tenant_major",
            Self::TableMajor => "table_major",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary counters over a matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixStats {
    pub total_cells: usize,
    /// Cells with a found watermark.
    pub synced: usize,
    /// Found cells synced within the last day.
    pub synced_recently: usize,
    /// Cells without a found watermark (including unprobed cells).
    pub missing: usize,
    /// Cells never probed because the scan was cut short.
    pub unprobed: usize,
}

#[derive(Debug, Clone)]
pub struct SyncMatrix {
    tenants: Vec<Tenant>,
    tables: Vec<String>,
    cells: Vec<Option<ProbeResult>>,
    tenant_index: HashMap<TenantId, usize>,
}

impl SyncMatrix {
    /// Create an empty matrix for the cross product of `tenants` and `tables`.
    #[must_use]
    pub fn new(tenants: Vec<Tenant>, tables: Vec<String>) -> Self {
        let cells = vec![None; tenants.len() * tables.len()];
        let tenant_index = tenants
            .iter()
            .enumerate()
            .map(|(index, tenant)| (tenant.id, index))
            .collect();
        Self {
            tenants,
            tables,
            cells,
            tenant_index,
        }
    }

    #[must_use]
    pub fn tenants(&self) -> &[Tenant] {
        &self.tenants
    }

    #[must_use]
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    #[must_use]
    pub const fn total_cells(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn filled_cells(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Every `(tenant_index, table_index)` pair in dispatch order.
    #[must_use]
    pub fn cell_order(&self, orientation: Orientation) -> Vec<(usize, usize)> {
        let tenants = 0..self.tenants.len();
        let tables = 0..self.tables.len();
        match orientation {
            Orientation::TenantMajor => tenants
                .flat_map(|t| tables.clone().map(move |k| (t, k)))
                .collect(),
            Orientation::TableMajor => tables
                .flat_map(|k| tenants.clone().map(move |t| (t, k)))
                .collect(),
        }
    }

    fn slot(&self, tenant_index: usize, table_index: usize) -> Result<usize, CoreError> {
        if tenant_index >= self.tenants.len() || table_index >= self.tables.len() {
            return Err(CoreError::CellOutOfRange {
                tenant_index,
                table_index,
            });
        }
        Ok(tenant_index * self.tables.len() + table_index)
    }

    /// Store the result for one slot.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CellOutOfRange`] for an index outside the grid and
    /// [`CoreError::DuplicateCell`] if the slot already holds a result.
    pub fn insert(
        &mut self,
        tenant_index: usize,
        table_index: usize,
        result: ProbeResult,
    ) -> Result<(), CoreError> {
        let slot = self.slot(tenant_index, table_index)?;
        if self.cells[slot].is_some() {
            return Err(CoreError::DuplicateCell {
                tenant_id: result.tenant_id,
                table: result.table,
            });
        }
        self.cells[slot] = Some(result);
        Ok(())
    }

    #[must_use]
    pub fn cell(&self, tenant_index: usize, table_index: usize) -> Option<&ProbeResult> {
        self.slot(tenant_index, table_index)
            .ok()
            .and_then(|slot| self.cells[slot].as_ref())
    }

    /// Look up a cell by tenant id and table name.
    #[must_use]
    pub fn get(&self, tenant_id: TenantId, table: &str) -> Option<&ProbeResult> {
        let tenant_index = *self.tenant_index.get(&tenant_id)?;
        let table_index = self.tables.iter().position(|name| name == table)?;
        self.cell(tenant_index, table_index)
    }

    /// All probe results, tenant-major.
    pub fn results(&self) -> impl Iterator<Item = &ProbeResult> {
        self.cells.iter().flatten()
    }

    /// Probe results whose status is not `Found`.
    pub fn failures(&self) -> impl Iterator<Item = &ProbeResult> {
        self.results().filter(|result| !result.status.is_found())
    }

    /// Pairs left unprobed by a cancelled scan.
    #[must_use]
    pub fn missing(&self) -> Vec<(TenantId, &str)> {
        self.cell_order(Orientation::TenantMajor)
            .into_iter()
            .filter(|(t, k)| self.cell(*t, *k).is_none())
            .map(|(t, k)| (self.tenants[t].id, self.tables[k].as_str()))
            .collect()
    }

    #[must_use]
    pub fn stats(&self, now: DateTime<Local>) -> MatrixStats {
        let mut stats = MatrixStats {
            total_cells: self.total_cells(),
            ..MatrixStats::default()
        };

        for cell in &self.cells {
            let Some(result) = cell else {
                stats.unprobed += 1;
                continue;
            };
            if let Some(watermark) = result.watermark() {
                stats.synced += 1;
                if classify(Some(watermark), now) == FreshnessBucket::Fresh {
                    stats.synced_recently += 1;
                }
            }
        }

        stats.missing = stats.total_cells - stats.synced;
        stats
    }
}
