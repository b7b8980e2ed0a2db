//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for safe, sandboxed env var manipulation.

use figment::Jail;
use pretty_assertions::assert_eq;
use sw_config::{ConfigError, SwConfig};
use sw_core::{NullWritePolicy, Orientation, TableRef};

fn isolate_user_config(jail: &mut Jail) {
    let dir = jail.directory().join("xdg");
    jail.set_env("XDG_CONFIG_HOME", dir.display());
}

#[test]
fn loads_project_config_from_dot_directory() {
    Jail::expect_with(|jail| {
        isolate_user_config(jail);
        jail.create_dir(".syncwatch")?;
        jail.create_file(
            ".syncwatch/config.toml",
            r#"
active_environment = "qua"

[central]
metadata_table = "meta-proj.management.tables"
consolidated_table = "meta-proj.settings.consolidated"
max_tables = 5

[scan]
concurrency = 16
scan_timeout_secs = 600
check_empty_first = false
orientation = "table_major"

[reconcile]
null_write_policy = "preserve"
"#,
        )?;

        let config = SwConfig::load(None).map_err(|e| e.to_string())?;

        assert_eq!(config.active_environment, "qua");
        assert_eq!(
            config.central.metadata_table,
            TableRef::new("meta-proj", "management", "tables")
        );
        assert_eq!(config.central.max_tables, 5);
        assert_eq!(config.scan.concurrency, 16);
        assert_eq!(config.scan.scan_timeout_secs, Some(600));
        assert!(!config.scan.check_empty_first);
        assert_eq!(config.scan.orientation, Orientation::TableMajor);
        assert_eq!(config.reconcile.null_write_policy, NullWritePolicy::Preserve);
        // untouched sections keep defaults
        assert_eq!(config.scan.watermark_column, "_etl_synced");
        assert_eq!(config.environments.len(), 3);
        Ok(())
    });
}

#[test]
fn explicit_file_overrides_project_file() {
    Jail::expect_with(|jail| {
        isolate_user_config(jail);
        jail.create_dir(".syncwatch")?;
        jail.create_file(
            ".syncwatch/config.toml",
            "[scan]\nconcurrency = 2\nprobe_timeout_secs = 5\n",
        )?;
        jail.create_file("override.toml", "[scan]\nconcurrency = 32\n")?;

        let config = SwConfig::load(Some(std::path::Path::new("override.toml")))
            .map_err(|e| e.to_string())?;

        assert_eq!(config.scan.concurrency, 32);
        assert_eq!(config.scan.probe_timeout_secs, 5);
        Ok(())
    });
}

#[test]
fn custom_environment_list_replaces_defaults() {
    Jail::expect_with(|jail| {
        isolate_user_config(jail);
        jail.create_file(
            "custom.toml",
            r#"
active_environment = "prod"

[[environments]]
name = "prod"
project_id = "acme-prod"

[[environments]]
name = "legacy"
project_id = "acme-legacy"
registry_dataset = "admin"
registry_table = "tenants"

[warehouse]
database = ":memory:"

[warehouse.attach]
acme-prod = "/data/acme-prod.duckdb"
"#,
        )?;

        let config = SwConfig::load(Some(std::path::Path::new("custom.toml")))
            .map_err(|e| e.to_string())?;

        assert_eq!(config.environments.len(), 2);
        assert_eq!(
            config.environment("legacy").unwrap().registry_ref().to_string(),
            "acme-legacy.admin.tenants"
        );
        assert_eq!(config.warehouse.database, ":memory:");
        assert_eq!(
            config.warehouse.attach.get("acme-prod").map(String::as_str),
            Some("/data/acme-prod.duckdb")
        );
        Ok(())
    });
}

#[test]
fn invalid_table_reference_fails_extraction() {
    Jail::expect_with(|jail| {
        isolate_user_config(jail);
        jail.create_file("bad.toml", "[central]\nmetadata_table = \"just_a_table\"\n")?;

        let result = SwConfig::load(Some(std::path::Path::new("bad.toml")));
        assert!(matches!(result, Err(ConfigError::Figment(_))));
        Ok(())
    });
}

#[test]
fn validation_runs_after_extraction() {
    Jail::expect_with(|jail| {
        isolate_user_config(jail);
        jail.create_file("bad.toml", "[central]\nmax_tables = 0\n")?;

        let result = SwConfig::load(Some(std::path::Path::new("bad.toml")));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "central.max_tables"
        ));
        Ok(())
    });
}

#[test]
fn explicit_file_outside_working_directory() {
    Jail::expect_with(|jail| {
        isolate_user_config(jail);
        let dir = tempfile::tempdir().map_err(|e| e.to_string())?;
        let path = dir.path().join("syncwatch.toml");
        std::fs::write(
            &path,
            "active_environment = \"pro\"\n\n[reconcile]\nretry_attempts = 5\n",
        )
        .map_err(|e| e.to_string())?;

        let config = SwConfig::load(Some(path.as_path())).map_err(|e| e.to_string())?;

        assert_eq!(config.active_environment, "pro");
        assert_eq!(config.reconcile.retry_attempts, 5);
        assert_eq!(
            config.active().map_err(|e| e.to_string())?.project_id,
            "constant-height-455614-i0"
        );
        Ok(())
    });
}
