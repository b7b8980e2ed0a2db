//! # sw-core
//!
//! Core types and error types for syncwatch.
//!
//! This crate provides the foundational types shared across all syncwatch crates:
//! - Tenants and monitored tables as loaded from the metadata stores
//! - Fully qualified warehouse table references
//! - Watermarks that keep their original zone information
//! - Probe outcomes (a closed set of tagged statuses)
//! - The tenant x table sync matrix and its statistics
//! - Consolidated-record updates and the null-write policy
//! - The freshness classifier used for display

pub mod consolidated;
pub mod errors;
pub mod freshness;
pub mod matrix;
pub mod probe;
pub mod table_ref;
pub mod tenant;
pub mod watermark;

pub use consolidated::{ConsolidatedRecord, ConsolidatedUpdate, MergeOutcome, NullWritePolicy};
pub use errors::CoreError;
pub use freshness::{FreshnessBucket, classify};
pub use matrix::{MatrixStats, Orientation, SyncMatrix};
pub use probe::{ProbeResult, ProbeStatus};
pub use table_ref::TableRef;
pub use tenant::{MonitoredTable, Tenant, TenantId};
pub use watermark::Watermark;
