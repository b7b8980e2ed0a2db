//! Cross-cutting error types for syncwatch.
//!
//! Domain-specific errors (e.g., `WarehouseError`, `ResolveError`) are defined in
//! their respective crates. The binary converges everything into `anyhow`.

use thiserror::Error;

use crate::tenant::TenantId;

/// Errors that can be raised while building or validating core types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A table reference did not have the `project.dataset.table` shape.
    #[error("Invalid table reference '{0}': expected project.dataset.table")]
    InvalidTableRef(String),

    /// A watermark string could not be parsed as a timestamp.
    #[error("Invalid watermark '{0}'")]
    InvalidWatermark(String),

    /// A matrix slot index is outside the tenant x table grid.
    #[error("Matrix cell out of range: tenant #{tenant_index}, table #{table_index}")]
    CellOutOfRange {
        tenant_index: usize,
        table_index: usize,
    },

    /// A matrix slot received a second probe result.
    #[error("Matrix cell already filled: tenant {tenant_id}, table {table}")]
    DuplicateCell { tenant_id: TenantId, table: String },

    /// Data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),
}
