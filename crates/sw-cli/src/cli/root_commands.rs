use clap::{Args, Subcommand, ValueEnum};
use sw_core::{NullWritePolicy, Orientation};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Probe every tenant x table pair and print the sync matrix.
    Scan(ScanArgs),
    /// Probe the pairs of the consolidated store and update their records.
    Reconcile(ReconcileArgs),
    /// List the monitored tables a scan covers.
    Tables,
    /// List the active tenants of the environment.
    Tenants,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OrientationArg {
    /// One row per tenant.
    TenantMajor,
    /// One row per table.
    TableMajor,
}

impl From<OrientationArg> for Orientation {
    fn from(value: OrientationArg) -> Self {
        match value {
            OrientationArg::TenantMajor => Self::TenantMajor,
            OrientationArg::TableMajor => Self::TableMajor,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum NullPolicyArg {
    /// Write a null watermark and zero rows for tables without data.
    Overwrite,
    /// Keep the existing record for tables without data.
    Preserve,
}

impl From<NullPolicyArg> for NullWritePolicy {
    fn from(value: NullPolicyArg) -> Self {
        match value {
            NullPolicyArg::Overwrite => Self::Overwrite,
            NullPolicyArg::Preserve => Self::Preserve,
        }
    }
}

#[derive(Clone, Debug, Args)]
pub struct ScanArgs {
    /// Matrix layout (defaults to the configured orientation).
    #[arg(long, value_enum)]
    pub orientation: Option<OrientationArg>,

    /// List every cell without data and its cause.
    #[arg(long)]
    pub debug: bool,

    /// Maximum probes in flight.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Stop the scan after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Clone, Debug, Args)]
pub struct ReconcileArgs {
    /// How to write pairs whose table has no data.
    #[arg(long, value_enum)]
    pub null_policy: Option<NullPolicyArg>,

    /// Probe and report without writing.
    #[arg(long)]
    pub dry_run: bool,
}
