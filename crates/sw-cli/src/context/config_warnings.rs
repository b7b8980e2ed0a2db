use sw_config::SwConfig;

const SECTIONS: [&str; 4] = ["WAREHOUSE", "CENTRAL", "SCAN", "RECONCILE"];

/// Emit warnings for likely mistyped env var keys that silently fell back to defaults.
pub fn warn_unconfigured(config: &SwConfig) {
    for warning in collect_unconfigured_warnings(config, std::env::vars()) {
        tracing::warn!("{warning}");
    }
}

fn collect_unconfigured_warnings<I>(config: &SwConfig, env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env_keys = env.into_iter().map(|(key, _)| key).collect::<Vec<_>>();

    let mut warnings = Vec::new();

    for section in SECTIONS {
        let single = format!("SYNCWATCH_{section}_");
        let double = format!("SYNCWATCH_{section}__");
        for key in &env_keys {
            if key.starts_with(&single) && !key.starts_with(&double) {
                let field = &key[single.len()..];
                warnings.push(format!(
                    "{key} is ignored. Use double underscores (example: {double}{field})."
                ));
            }
        }
    }

    if !config.warehouse.uses_motherduck() && has_env_prefix(&env_keys, "SYNCWATCH_MOTHERDUCK") {
        warnings.push(
            "MotherDuck appears unconfigured while SYNCWATCH_MOTHERDUCK* env vars exist. Use the warehouse section (example: SYNCWATCH_WAREHOUSE__MOTHERDUCK_TOKEN)."
                .to_string(),
        );
    }

    warnings
}

fn has_env_prefix(keys: &[String], prefix: &str) -> bool {
    keys.iter().any(|key| key.starts_with(prefix))
}
