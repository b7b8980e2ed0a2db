//! Warehouse error types.

/// Errors that can occur while talking to the warehouse.
#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    /// The referenced table (or catalog/schema) does not exist.
    #[error("Table not found: {0}")]
    NotFound(String),

    /// A referenced column does not exist.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// The caller is not allowed to read or write the object.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// The operation ran out of time.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Temporary backend condition (lock contention, dropped connection).
    #[error("Transient warehouse error: {0}")]
    Transient(String),

    /// `DuckDB` operation failed.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// Blocking task failed to complete.
    #[error("Warehouse task failed: {0}")]
    Task(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(String),
}

impl WarehouseError {
    /// Whether retrying the same operation may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Timeout(_))
    }

    /// Classify a raw `DuckDB` error by its message.
    ///
    /// `DuckDB` reports most failures as a message prefixed with the error
    /// class (`Catalog Error`, `Binder Error`, `IO Error`, ...).
    #[must_use]
    pub fn classify(err: duckdb::Error) -> Self {
        let msg = err.to_string();
        let lower = msg.to_ascii_lowercase();

        if lower.contains("catalog error") && lower.contains("does not exist") {
            Self::NotFound(msg)
        } else if lower.contains("binder error") && lower.contains("column") {
            Self::MissingColumn(msg)
        } else if lower.contains("permission")
            || lower.contains("access denied")
            || lower.contains("unauthorized")
        {
            Self::AccessDenied(msg)
        } else if lower.contains("interrupt")
            || lower.contains("timed out")
            || lower.contains("timeout")
        {
            Self::Timeout(msg)
        } else if lower.contains("could not set lock")
            || lower.contains("conflict")
            || lower.contains("conflicting lock")
            || lower.contains("connection reset")
            || lower.contains("connection closed")
        {
            Self::Transient(msg)
        } else {
            Self::DuckDb(err)
        }
    }
}
