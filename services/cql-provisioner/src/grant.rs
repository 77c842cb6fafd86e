use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use svckit::database::SessionGateway;
use svckit::errors::ProvisionError;
use svckit::types::ColumnValue;
use tracing::info;

use crate::lookup::{lookup_row, Existence, Reconciled};
use crate::translator::MetadataStatements;

/// Data object a grant applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrantScope {
    Keyspace { keyspace: String },
    Table { keyspace: String, table: String },
}

impl GrantScope {
    /// `data/<keyspace>` or `data/<keyspace>/<table>`
    pub fn resource_path(&self) -> String {
        match self {
            GrantScope::Keyspace { keyspace } => format!("data/{}", keyspace),
            GrantScope::Table { keyspace, table } => format!("data/{}/{}", keyspace, table),
        }
    }

    /// `<role>_<keyspace>` or `<role>_<keyspace>_<table>`
    pub fn key(&self, role: &str) -> String {
        match self {
            GrantScope::Keyspace { keyspace } => format!("{}_{}", role, keyspace),
            GrantScope::Table { keyspace, table } => format!("{}_{}_{}", role, keyspace, table),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantConfig {
    pub role: String,
    pub scope: GrantScope,
    pub permissions: BTreeSet<String>,
}

impl GrantConfig {
    pub fn key(&self) -> String {
        self.scope.key(&self.role)
    }

    pub fn resource_path(&self) -> String {
        self.scope.resource_path()
    }
}

/// Reconciles rows of `role_permissions`. Keyspace- and table-scoped grants
/// share this reconciler and differ only in their [`GrantScope`].
#[derive(Debug, Clone, Default)]
pub struct GrantReconciler {
    statements: MetadataStatements,
}

impl GrantReconciler {
    pub fn new(statements: MetadataStatements) -> Self {
        Self { statements }
    }

    /// Write the full permission set for (role, resource).
    ///
    /// The `permissions` cell holds one set value, so a second write
    /// replaces the first rather than adding to it.
    pub async fn create_or_update(
        &self,
        session: &dyn SessionGateway,
        config: &GrantConfig,
    ) -> Result<Reconciled<GrantConfig>, ProvisionError> {
        let stmt = self.statements.upsert_grant();
        let resource = config.resource_path();
        info!(
            "Granting {:?} on {} to role {}",
            config.permissions, resource, config.role
        );

        let values = vec![
            ColumnValue::text(config.role.as_str()),
            ColumnValue::text(resource.as_str()),
            ColumnValue::text_set(config.permissions.iter().cloned()),
        ];
        session
            .execute(&stmt, values)
            .await
            .map_err(|e| {
                ProvisionError::statement(&stmt, &[config.role.as_str(), resource.as_str()], e)
            })?;

        Ok(Reconciled {
            key: config.key(),
            observed: config.clone(),
        })
    }

    /// Permission set stored for (role, scope), exactly as stored.
    pub async fn read(
        &self,
        session: &dyn SessionGateway,
        role: &str,
        scope: &GrantScope,
    ) -> Result<BTreeSet<String>, ProvisionError> {
        let resource = scope.resource_path();
        let stmt = self.statements.select_grant();
        let row = lookup_row(session, &stmt, &[role, resource.as_str()]).await?;
        row.text_set("permissions")
    }

    pub async fn delete(
        &self,
        session: &dyn SessionGateway,
        role: &str,
        scope: &GrantScope,
    ) -> Result<(), ProvisionError> {
        let stmt = self.statements.delete_grant();
        let resource = scope.resource_path();
        info!("Revoking all permissions on {} from role {}", resource, role);
        session
            .execute(&stmt, vec![ColumnValue::text(role), ColumnValue::text(resource.as_str())])
            .await
            .map_err(|e| ProvisionError::statement(&stmt, &[role, resource.as_str()], e))
    }

    pub async fn exists(
        &self,
        session: &dyn SessionGateway,
        role: &str,
        scope: &GrantScope,
    ) -> Existence {
        Existence::from_lookup(self.read(session, role, scope).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyspace_scope_path_and_key() {
        let scope = GrantScope::Keyspace {
            keyspace: "ks1".to_string(),
        };
        assert_eq!(scope.resource_path(), "data/ks1");
        assert_eq!(scope.key("app"), "app_ks1");
    }

    #[test]
    fn test_table_scope_path_and_key() {
        let scope = GrantScope::Table {
            keyspace: "ks1".to_string(),
            table: "tbl1".to_string(),
        };
        assert_eq!(scope.resource_path(), "data/ks1/tbl1");
        assert_eq!(scope.key("app"), "app_ks1_tbl1");
    }
}
