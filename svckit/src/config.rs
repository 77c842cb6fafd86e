use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::ConsistencyLevel;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub driver: String,
    pub hosts: Vec<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub consistency: ConsistencyLevel,
    pub connection_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub pool_size: u32,
    pub tls: TlsConfig,
}

impl DatabaseConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn contact_points(&self) -> Vec<String> {
        self.hosts
            .iter()
            .map(|host| format!("{}:{}", host, self.port))
            .collect()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: "scylla".to_string(),
            hosts: vec!["localhost".to_string()],
            port: 9042,
            username: None,
            password: None,
            consistency: ConsistencyLevel::Quorum,
            connection_timeout_secs: 10,
            request_timeout_secs: 60,
            pool_size: 4,
            tls: TlsConfig::default(),
        }
    }
}

/// Client TLS. Peer verification is off unless asked for, matching how
/// clusters with self-signed node certificates are usually reached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    pub enabled: bool,
    /// PEM bundle used to verify node certificates.
    pub ca_file: Option<String>,
    pub verify_peer: bool,
}

/// Keyspaces holding the cluster's own metadata tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemKeyspaces {
    /// Holds `roles` and `role_permissions`.
    pub auth: String,
    /// Holds `keyspaces`.
    pub schema: String,
}

impl Default for SystemKeyspaces {
    fn default() -> Self {
        Self {
            auth: "system_auth".to_string(),
            schema: "system_schema".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
