// svckit/src/database/factory.rs
//
// Connection factory: builds the one session every reconciler reuses.
// Supports: ScyllaDB, Cassandra 3.x/4.x (both over the scylla driver)
//

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::gateway::SessionGateway;
use super::scylla::ScyllaConnection;
use crate::config::DatabaseConfig;
use crate::errors::GatewayError;

/// Supported database drivers
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    #[default]
    Scylla,
    Cassandra,
}

impl DatabaseDriver {
    pub fn name(&self) -> &'static str {
        match self {
            DatabaseDriver::Scylla => "scylla",
            DatabaseDriver::Cassandra => "cassandra",
        }
    }
}

impl From<&str> for DatabaseDriver {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "cassandra" | "cassandra4" | "cass" => DatabaseDriver::Cassandra,
            _ => DatabaseDriver::Scylla,
        }
    }
}

impl From<String> for DatabaseDriver {
    fn from(s: String) -> Self {
        DatabaseDriver::from(s.as_str())
    }
}

/// Database connection factory
pub struct DatabaseFactory;

impl DatabaseFactory {
    pub async fn create(
        driver: DatabaseDriver,
        config: &DatabaseConfig,
    ) -> Result<Arc<dyn SessionGateway>, GatewayError> {
        info!("Creating database connection with driver: {:?}", driver);

        if driver == DatabaseDriver::Cassandra {
            info!("Using Scylla driver for Cassandra compatibility");
        }
        let conn = ScyllaConnection::new(config, driver.name()).await?;
        Ok(Arc::new(conn))
    }

    /// Create from config (reads driver field from config)
    pub async fn create_from_config(
        config: &DatabaseConfig,
    ) -> Result<Arc<dyn SessionGateway>, GatewayError> {
        let driver = DatabaseDriver::from(config.driver.as_str());
        Self::create(driver, config).await
    }
}
