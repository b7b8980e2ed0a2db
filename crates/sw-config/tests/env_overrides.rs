use figment::Jail;
use sw_config::SwConfig;
use sw_core::NullWritePolicy;

#[test]
fn env_vars_override_defaults() {
    Jail::expect_with(|jail| {
        jail.set_env("XDG_CONFIG_HOME", jail.directory().join("xdg").display());
        jail.set_env("SYNCWATCH_ACTIVE_ENVIRONMENT", "pro");
        jail.set_env("SYNCWATCH_SCAN__CONCURRENCY", "3");
        jail.set_env("SYNCWATCH_RECONCILE__NULL_WRITE_POLICY", "preserve");

        let config = SwConfig::load(None).map_err(|e| e.to_string())?;
        assert_eq!(config.active_environment, "pro");
        assert_eq!(config.active().unwrap().project_id, "constant-height-455614-i0");
        assert_eq!(config.scan.concurrency, 3);
        assert_eq!(config.reconcile.null_write_policy, NullWritePolicy::Preserve);
        Ok(())
    });
}

#[test]
fn env_beats_project_file() {
    Jail::expect_with(|jail| {
        jail.set_env("XDG_CONFIG_HOME", jail.directory().join("xdg").display());
        jail.create_dir(".syncwatch")?;
        jail.create_file(".syncwatch/config.toml", "[warehouse]\ndatabase = \"file.duckdb\"\n")?;
        jail.set_env("SYNCWATCH_WAREHOUSE__DATABASE", "env.duckdb");

        let config = SwConfig::load(None).map_err(|e| e.to_string())?;
        assert_eq!(config.warehouse.database, "env.duckdb");
        Ok(())
    });
}

#[test]
fn motherduck_token_from_env() {
    Jail::expect_with(|jail| {
        jail.set_env("XDG_CONFIG_HOME", jail.directory().join("xdg").display());
        jail.set_env("SYNCWATCH_WAREHOUSE__MOTHERDUCK_TOKEN", "md-secret");

        let config = SwConfig::load(None).map_err(|e| e.to_string())?;
        assert!(config.warehouse.uses_motherduck());
        assert_eq!(
            config.warehouse.connection_string(),
            "md:syncwatch?motherduck_token=md-secret"
        );
        Ok(())
    });
}
