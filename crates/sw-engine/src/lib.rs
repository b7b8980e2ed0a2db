//! # sw-engine
//!
//! Cross-tenant sync-status aggregation and reconciliation.
//!
//! Data flows leaves first:
//! - [`resolver`] reads the tenant set and the monitored table set
//! - [`probe`] reads one tenant's bronze table and classifies the outcome
//! - [`matrix`] probes the whole cross product with bounded concurrency
//! - [`locator`] maps tenant ids to storage projects across environments
//! - [`reconcile`] merges probe results into the consolidated store
//!
//! Nothing below the resolver fails outward: probe failures become
//! statuses, merge failures become counts.

pub mod error;
pub mod locator;
pub mod matrix;
pub mod probe;
pub mod reconcile;
pub mod resolver;

#[cfg(test)]
mod fake;

pub use error::{EngineError, ResolveError};
pub use locator::{ChainLocator, KnownLocations, PriorityLocator, TenantLocator};
pub use matrix::{MatrixBuilder, NoProgress, ScanOutcome, ScanProgress, StopReason};
pub use probe::{ProbeSettings, ProbeTarget, StorageProbe};
pub use reconcile::{ReconcileReport, ReconcileSummary, Reconciler, ReconciliationJob};
pub use resolver::{MetadataResolver, TableSelection, select_tables, select_tenants};
