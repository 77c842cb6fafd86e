use serde::{Deserialize, Serialize};
use svckit::database::SessionGateway;
use svckit::errors::{GatewayError, ProvisionError};
use tracing::{info, warn};

use crate::lookup::{lookup_row, Existence, Reconciled};
use crate::translator::{
    build_drop_keyspace_statement, build_keyspace_statement, parse_keyspace_metadata,
    KeyspaceVerb, MetadataStatements, ReplicationStrategy,
};

/// Marker in the server message returned when dropping an unknown keyspace.
/// The driver has no typed error for this case.
const DROP_MISSING_KEYSPACE: &str = "Cannot drop non existing keyspace";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyspaceConfig {
    pub name: String,
    pub replication_strategy: ReplicationStrategy,
}

impl KeyspaceConfig {
    pub fn key(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Clone, Default)]
pub struct KeyspaceReconciler {
    statements: MetadataStatements,
}

impl KeyspaceReconciler {
    pub fn new(statements: MetadataStatements) -> Self {
        Self { statements }
    }

    /// Create the keyspace, falling back to ALTER when it already exists,
    /// then read the live definition back.
    pub async fn create_or_update(
        &self,
        session: &dyn SessionGateway,
        config: &KeyspaceConfig,
    ) -> Result<Reconciled<KeyspaceConfig>, ProvisionError> {
        let stmt = build_keyspace_statement(config, KeyspaceVerb::Create)?;
        info!("CREATE keyspace with name: {}", config.name);

        match session.execute(&stmt, Vec::new()).await {
            Ok(()) => {}
            Err(GatewayError::AlreadyExists(message)) => {
                warn!("Keyspace {} already exists ({}), altering instead", config.name, message);
                self.alter(session, config).await?;
            }
            Err(e) => return Err(ProvisionError::statement(&stmt, &[config.name.as_str()], e)),
        }

        self.read_back(session, config).await
    }

    /// Apply a changed replication strategy to an existing keyspace.
    pub async fn update(
        &self,
        session: &dyn SessionGateway,
        config: &KeyspaceConfig,
    ) -> Result<Reconciled<KeyspaceConfig>, ProvisionError> {
        self.alter(session, config).await?;
        self.read_back(session, config).await
    }

    async fn alter(
        &self,
        session: &dyn SessionGateway,
        config: &KeyspaceConfig,
    ) -> Result<(), ProvisionError> {
        let stmt = build_keyspace_statement(config, KeyspaceVerb::Alter)?;
        info!("ALTER keyspace with name: {}", config.name);
        session
            .execute(&stmt, Vec::new())
            .await
            .map_err(|e| ProvisionError::statement(&stmt, &[config.name.as_str()], e))
    }

    async fn read_back(
        &self,
        session: &dyn SessionGateway,
        config: &KeyspaceConfig,
    ) -> Result<Reconciled<KeyspaceConfig>, ProvisionError> {
        let observed = self.read(session, &config.name).await?;
        Ok(Reconciled {
            key: config.key(),
            observed,
        })
    }

    pub async fn read(
        &self,
        session: &dyn SessionGateway,
        name: &str,
    ) -> Result<KeyspaceConfig, ProvisionError> {
        let row = lookup_row(session, &self.statements.select_keyspace(), &[name]).await?;
        parse_keyspace_metadata(&row)
    }

    /// Drop the keyspace. Dropping a keyspace that does not exist succeeds.
    pub async fn delete(
        &self,
        session: &dyn SessionGateway,
        name: &str,
    ) -> Result<(), ProvisionError> {
        let stmt = build_drop_keyspace_statement(name)?;
        info!("DROP keyspace with name: {}", name);

        match session.execute(&stmt, Vec::new()).await {
            Ok(()) => Ok(()),
            Err(e) if e.to_string().contains(DROP_MISSING_KEYSPACE) => {
                warn!("Keyspace {} does not exist, nothing to drop", name);
                Ok(())
            }
            Err(e) => Err(ProvisionError::statement(&stmt, &[name], e)),
        }
    }

    pub async fn exists(&self, session: &dyn SessionGateway, name: &str) -> Existence {
        Existence::from_lookup(self.read(session, name).await)
    }

    /// Adopt an existing keyspace; the key of a keyspace is its name.
    pub async fn import(
        &self,
        session: &dyn SessionGateway,
        key: &str,
    ) -> Result<Reconciled<KeyspaceConfig>, ProvisionError> {
        let observed = self.read(session, key).await?;
        Ok(Reconciled {
            key: observed.key(),
            observed,
        })
    }
}
