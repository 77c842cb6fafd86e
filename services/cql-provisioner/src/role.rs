use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use svckit::database::SessionGateway;
use svckit::errors::ProvisionError;
use svckit::types::{ColumnValue, RowData};
use tracing::info;

use crate::lookup::{lookup_row, Existence, Reconciled};
use crate::translator::MetadataStatements;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConfig {
    pub name: String,
    pub can_login: bool,
    pub is_superuser: bool,
    pub member_of: BTreeSet<String>,
}

impl RoleConfig {
    pub fn key(&self) -> String {
        self.name.clone()
    }

    fn from_row(row: &RowData) -> Result<Self, ProvisionError> {
        Ok(Self {
            name: row.text("role")?,
            can_login: row.boolean("can_login")?,
            is_superuser: row.boolean("is_superuser")?,
            member_of: row.text_set("member_of")?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RoleReconciler {
    statements: MetadataStatements,
}

impl RoleReconciler {
    pub fn new(statements: MetadataStatements) -> Self {
        Self { statements }
    }

    /// Upsert the role row. No existence check: the insert overwrites.
    pub async fn create_or_update(
        &self,
        session: &dyn SessionGateway,
        config: &RoleConfig,
    ) -> Result<Reconciled<RoleConfig>, ProvisionError> {
        let stmt = self.statements.upsert_role();
        info!(
            "Upserting role {} (login: {}, superuser: {}, member_of: {:?})",
            config.name, config.can_login, config.is_superuser, config.member_of
        );

        let values = vec![
            ColumnValue::text(config.name.as_str()),
            ColumnValue::Boolean(config.can_login),
            ColumnValue::Boolean(config.is_superuser),
            ColumnValue::text_set(config.member_of.iter().cloned()),
        ];
        session
            .execute(&stmt, values)
            .await
            .map_err(|e| ProvisionError::statement(&stmt, &[config.name.as_str()], e))?;

        Ok(Reconciled {
            key: config.key(),
            observed: config.clone(),
        })
    }

    pub async fn read(
        &self,
        session: &dyn SessionGateway,
        name: &str,
    ) -> Result<RoleConfig, ProvisionError> {
        let row = lookup_row(session, &self.statements.select_role(), &[name]).await?;
        RoleConfig::from_row(&row)
    }

    pub async fn delete(
        &self,
        session: &dyn SessionGateway,
        name: &str,
    ) -> Result<(), ProvisionError> {
        let stmt = self.statements.delete_role();
        info!("Deleting role {}", name);
        session
            .execute(&stmt, vec![ColumnValue::text(name)])
            .await
            .map_err(|e| ProvisionError::statement(&stmt, &[name], e))
    }

    pub async fn exists(&self, session: &dyn SessionGateway, name: &str) -> Existence {
        Existence::from_lookup(self.read(session, name).await)
    }

    pub async fn import(
        &self,
        session: &dyn SessionGateway,
        key: &str,
    ) -> Result<Reconciled<RoleConfig>, ProvisionError> {
        let observed = self.read(session, key).await?;
        Ok(Reconciled {
            key: observed.key(),
            observed,
        })
    }
}
