use anyhow::Result;
use config::{Config, File};
use serde::{Deserialize, Serialize};
use svckit::config::{DatabaseConfig, ObservabilityConfig, SystemKeyspaces};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionerConfig {
    pub database: DatabaseConfig,
    pub schema: SystemKeyspaces,
    pub observability: ObservabilityConfig,
}

pub fn load_config(path: &str) -> Result<ProvisionerConfig> {
    let config = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix("CQL_PROVISIONER")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("database.hosts"),
        )
        .build()?;

    Ok(config.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use svckit::types::ConsistencyLevel;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_config("config/does-not-exist.yaml").unwrap();
        assert_eq!(config.schema, SystemKeyspaces::default());
        assert_eq!(config.database.consistency, ConsistencyLevel::Quorum);
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let config: ProvisionerConfig = serde_yaml::from_str(
            "database:\n  hosts: [\"10.0.0.5\"]\n  port: 9142\n  username: admin\n  password: secret\n",
        )
        .unwrap();
        assert_eq!(config.database.contact_points(), vec!["10.0.0.5:9142"]);
        assert_eq!(config.database.request_timeout_secs, 60);
        assert_eq!(config.schema.auth, "system_auth");
    }
}
