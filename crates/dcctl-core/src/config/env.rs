//! Environment overrides for the client config.

use super::ClientConfig;

pub const ORGANIZATION: &str = "DAGSTER_CLOUD_ORGANIZATION";
pub const DEPLOYMENT: &str = "DAGSTER_CLOUD_DEPLOYMENT";
pub const API_TOKEN: &str = "DAGSTER_CLOUD_API_TOKEN";

/// Overlay non-empty variables from `lookup` onto `config`.
pub fn apply_overrides(config: &mut ClientConfig, lookup: impl Fn(&str) -> Option<String>) {
    for (name, field) in [
        (ORGANIZATION, &mut config.organization),
        (DEPLOYMENT, &mut config.deployment),
        (API_TOKEN, &mut config.api_token),
    ] {
        if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
            tracing::debug!(variable = name, "config value taken from environment");
            *field = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = ClientConfig::new("file-org", "prod", "file-token");
        apply_overrides(
            &mut config,
            lookup(&[(ORGANIZATION, "env-org"), (API_TOKEN, "env-token")]),
        );
        assert_eq!(config.organization, "env-org");
        assert_eq!(config.deployment, "prod");
        assert_eq!(config.api_token, "env-token");
    }

    #[test]
    fn test_empty_variable_is_ignored() {
        let mut config = ClientConfig::new("acme", "prod", "tok");
        apply_overrides(&mut config, lookup(&[(DEPLOYMENT, "")]));
        assert_eq!(config.deployment, "prod");
    }
}
