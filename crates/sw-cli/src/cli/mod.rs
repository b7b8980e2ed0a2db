use std::path::PathBuf;

use clap::Parser;

pub mod global;
pub mod root_commands;

pub use global::{ColorMode, GlobalFlags, OutputFormat, ProgressMode};
pub use root_commands::{Commands, ReconcileArgs, ScanArgs};

/// Top-level CLI parser for the `swatch` binary.
#[derive(Debug, Parser)]
#[command(
    name = "swatch",
    version,
    about = "syncwatch - bronze table freshness across tenants"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, table, raw
    #[arg(short, long, global = true, default_value = "table")]
    pub format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Environment whose tenant registry is scanned (overrides config)
    #[arg(short, long, global = true)]
    pub env: Option<String>,

    /// Extra config file, highest file precedence
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Colored table output
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Progress bar on stderr
    #[arg(long, global = true, value_enum, default_value_t = ProgressMode::Auto)]
    pub progress: ProgressMode,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
            verbose: self.verbose,
            env: self.env.clone(),
            config: self.config.clone(),
            color: self.color,
            progress: self.progress,
        }
    }
}
