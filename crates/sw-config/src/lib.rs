//! # sw-config
//!
//! Layered configuration loading for syncwatch using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`SYNCWATCH_*` prefix, `__` as separator)
//! 2. An explicit file passed with `--config`
//! 3. Project-level `.syncwatch/config.toml`
//! 4. User-level `~/.config/syncwatch/config.toml`
//! 5. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `SYNCWATCH_SCAN__CONCURRENCY` -> `scan.concurrency`,
//! `SYNCWATCH_ACTIVE_ENVIRONMENT` -> `active_environment`, etc.
//!
//! The set of environments is always explicit configuration. Nothing here
//! inspects cloud client defaults or guesses the environment from project
//! names.
//!
//! # Usage
//!
//! ```no_run
//! use sw_config::SwConfig;
//!
//! let config = SwConfig::load_with_dotenv(None).expect("config");
//! let env = config.active().expect("active environment");
//! println!("tenants from {}", env.registry_ref());
//! ```

mod central;
mod environment;
mod error;
mod reconcile;
mod scan;
mod warehouse;

pub use central::CentralConfig;
pub use environment::{EnvironmentConfig, default_environments};
pub use error::ConfigError;
pub use reconcile::ReconcileConfig;
pub use scan::ScanConfig;
pub use warehouse::WarehouseConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

fn default_active_environment() -> String {
    String::from("dev")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SwConfig {
    #[serde(default)]
    pub warehouse: WarehouseConfig,
    #[serde(default)]
    pub central: CentralConfig,
    /// Declared environments; their order is the tenant-location priority.
    #[serde(default = "default_environments")]
    pub environments: Vec<EnvironmentConfig>,
    /// Environment whose tenant registry drives a scan.
    #[serde(default = "default_active_environment")]
    pub active_environment: String,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

impl Default for SwConfig {
    fn default() -> Self {
        Self {
            warehouse: WarehouseConfig::default(),
            central: CentralConfig::default(),
            environments: default_environments(),
            active_environment: default_active_environment(),
            scan: ScanConfig::default(),
            reconcile: ReconcileConfig::default(),
        }
    }
}

impl SwConfig {
    /// Load configuration from all sources and validate it.
    ///
    /// Does NOT call `dotenvy` -- use [`SwConfig::load_with_dotenv`] if you need `.env` loading.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if extraction fails or a value is invalid.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(explicit).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// The `.env` file is searched in the working directory and its parents.
    /// Variables already set in the process win over the file; a missing file
    /// is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if extraction fails or a value is invalid.
    pub fn load_with_dotenv(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load(explicit)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment directly or add providers on top.
    #[must_use]
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".syncwatch/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Explicit file
        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        // Layer 4: Environment variables (highest priority)
        figment.merge(Env::prefixed("SYNCWATCH_").split("__"))
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("syncwatch").join("config.toml"))
    }

    /// The environment whose registry drives scans.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownEnvironment`] if `active_environment` is not declared.
    pub fn active(&self) -> Result<&EnvironmentConfig, ConfigError> {
        self.environment(&self.active_environment)
    }

    /// Look up a declared environment by name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownEnvironment`] if no environment has that name.
    pub fn environment(&self, name: &str) -> Result<&EnvironmentConfig, ConfigError> {
        self.environments
            .iter()
            .find(|env| env.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ConfigError::UnknownEnvironment {
                name: name.to_string(),
                available: self
                    .environments
                    .iter()
                    .map(|env| env.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Check cross-field invariants that serde defaults cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environments.is_empty() {
            return Err(ConfigError::NotConfigured {
                section: "environments".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for env in &self.environments {
            if env.project_id.trim().is_empty() {
                return Err(invalid(
                    "environments.project_id",
                    &format!("environment '{}' has an empty project id", env.name),
                ));
            }
            if !seen.insert(env.name.to_ascii_lowercase()) {
                return Err(invalid(
                    "environments.name",
                    &format!("duplicate environment '{}'", env.name),
                ));
            }
        }

        self.active()?;

        if self.central.max_tables == 0 {
            return Err(invalid("central.max_tables", "must be at least 1"));
        }
        if self.scan.concurrency == 0 {
            return Err(invalid("scan.concurrency", "must be at least 1"));
        }
        if self.scan.probe_timeout_secs == 0 {
            return Err(invalid("scan.probe_timeout_secs", "must be at least 1"));
        }
        if self.scan.watermark_column.trim().is_empty() {
            return Err(invalid("scan.watermark_column", "must not be empty"));
        }
        if self.scan.bronze_dataset.trim().is_empty() {
            return Err(invalid("scan.bronze_dataset", "must not be empty"));
        }
        if self.reconcile.concurrency == 0 {
            return Err(invalid("reconcile.concurrency", "must be at least 1"));
        }
        if self.reconcile.retry_attempts == 0 {
            return Err(invalid("reconcile.retry_attempts", "must be at least 1"));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
