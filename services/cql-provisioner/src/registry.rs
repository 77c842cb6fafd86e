use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use svckit::config::SystemKeyspaces;
use svckit::database::SessionGateway;
use svckit::errors::ProvisionError;
use svckit::metrics;
use tracing::info;

use crate::grant::{GrantConfig, GrantReconciler, GrantScope};
use crate::keyspace::{KeyspaceConfig, KeyspaceReconciler};
use crate::lookup::{Existence, Reconciled};
use crate::role::{RoleConfig, RoleReconciler};
use crate::translator::MetadataStatements;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Keyspace,
    Role,
    GrantKeyspace,
    GrantTable,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Keyspace,
        ResourceKind::Role,
        ResourceKind::GrantKeyspace,
        ResourceKind::GrantTable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Keyspace => "cassandra_keyspace",
            ResourceKind::Role => "cassandra_role",
            ResourceKind::GrantKeyspace => "cassandra_grant_keyspace",
            ResourceKind::GrantTable => "cassandra_grant_table",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ProvisionError::ConfigError(format!("unknown resource kind {:?}", s)))
    }
}

/// One declared object, already typed.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Keyspace(KeyspaceConfig),
    Role(RoleConfig),
    Grant(GrantConfig),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Keyspace(_) => ResourceKind::Keyspace,
            Resource::Role(_) => ResourceKind::Role,
            Resource::Grant(grant) => match grant.scope {
                GrantScope::Keyspace { .. } => ResourceKind::GrantKeyspace,
                GrantScope::Table { .. } => ResourceKind::GrantTable,
            },
        }
    }

    pub fn key(&self) -> String {
        match self {
            Resource::Keyspace(ks) => ks.key(),
            Resource::Role(role) => role.key(),
            Resource::Grant(grant) => grant.key(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Drift {
    InSync,
    Missing,
    Drifted { live: Resource },
}

/// Maps each resource kind to its reconciler and runs them against one
/// shared session.
pub struct ResourceRegistry {
    session: Arc<dyn SessionGateway>,
    keyspaces: KeyspaceReconciler,
    roles: RoleReconciler,
    grants: GrantReconciler,
}

impl ResourceRegistry {
    pub fn new(session: Arc<dyn SessionGateway>, system: SystemKeyspaces) -> Self {
        let statements = MetadataStatements::new(system);
        info!("Resource registry using {} session", session.driver_name());
        Self {
            session,
            keyspaces: KeyspaceReconciler::new(statements.clone()),
            roles: RoleReconciler::new(statements.clone()),
            grants: GrantReconciler::new(statements),
        }
    }

    pub async fn apply(&self, resource: &Resource) -> Result<Reconciled<Resource>, ProvisionError> {
        let started = Instant::now();
        let session = self.session.as_ref();
        let result = match resource {
            Resource::Keyspace(ks) => self
                .keyspaces
                .create_or_update(session, ks)
                .await
                .map(|r| wrap(r, Resource::Keyspace)),
            Resource::Role(role) => self
                .roles
                .create_or_update(session, role)
                .await
                .map(|r| wrap(r, Resource::Role)),
            Resource::Grant(grant) => self
                .grants
                .create_or_update(session, grant)
                .await
                .map(|r| wrap(r, Resource::Grant)),
        };
        record("apply", resource.kind(), started, &result);
        result
    }

    /// Live state of the object identified by `resource`.
    pub async fn read(&self, resource: &Resource) -> Result<Resource, ProvisionError> {
        let started = Instant::now();
        let session = self.session.as_ref();
        let result = match resource {
            Resource::Keyspace(ks) => self
                .keyspaces
                .read(session, &ks.name)
                .await
                .map(Resource::Keyspace),
            Resource::Role(role) => self.roles.read(session, &role.name).await.map(Resource::Role),
            Resource::Grant(grant) => self
                .grants
                .read(session, &grant.role, &grant.scope)
                .await
                .map(|permissions| {
                    Resource::Grant(GrantConfig {
                        permissions,
                        ..grant.clone()
                    })
                }),
        };
        record("read", resource.kind(), started, &result);
        result
    }

    pub async fn delete(&self, resource: &Resource) -> Result<(), ProvisionError> {
        let started = Instant::now();
        let session = self.session.as_ref();
        let result = match resource {
            Resource::Keyspace(ks) => self.keyspaces.delete(session, &ks.name).await,
            Resource::Role(role) => self.roles.delete(session, &role.name).await,
            Resource::Grant(grant) => self.grants.delete(session, &grant.role, &grant.scope).await,
        };
        record("delete", resource.kind(), started, &result);
        result
    }

    pub async fn exists(&self, resource: &Resource) -> Existence {
        let started = Instant::now();
        let session = self.session.as_ref();
        let existence = match resource {
            Resource::Keyspace(ks) => self.keyspaces.exists(session, &ks.name).await,
            Resource::Role(role) => self.roles.exists(session, &role.name).await,
            Resource::Grant(grant) => self.grants.exists(session, &grant.role, &grant.scope).await,
        };
        // a definite "absent" is a successful answer
        metrics::record_operation(
            "exists",
            resource.kind().as_str(),
            existence.exists || existence.is_definitely_absent(),
            started.elapsed().as_secs_f64(),
        );
        existence
    }

    /// Adopt an existing object from its reconciliation key.
    ///
    /// Grant keys join role and object names with `_`, which cannot be split
    /// back apart unambiguously, so grants are not importable.
    pub async fn import(
        &self,
        kind: ResourceKind,
        key: &str,
    ) -> Result<Reconciled<Resource>, ProvisionError> {
        let started = Instant::now();
        let session = self.session.as_ref();
        let result = match kind {
            ResourceKind::Keyspace => self
                .keyspaces
                .import(session, key)
                .await
                .map(|r| wrap(r, Resource::Keyspace)),
            ResourceKind::Role => self
                .roles
                .import(session, key)
                .await
                .map(|r| wrap(r, Resource::Role)),
            ResourceKind::GrantKeyspace | ResourceKind::GrantTable => Err(
                ProvisionError::ConfigError(format!("{} does not support import", kind)),
            ),
        };
        record("import", kind, started, &result);
        result
    }

    /// Compare declared state with live state.
    pub async fn diff(&self, resource: &Resource) -> Result<Drift, ProvisionError> {
        match self.read(resource).await {
            Ok(live) if &live == resource => Ok(Drift::InSync),
            Ok(live) => Ok(Drift::Drifted { live }),
            Err(e) if e.is_not_found() => Ok(Drift::Missing),
            Err(e) => Err(e),
        }
    }
}

fn wrap<T>(reconciled: Reconciled<T>, into: fn(T) -> Resource) -> Reconciled<Resource> {
    Reconciled {
        key: reconciled.key,
        observed: into(reconciled.observed),
    }
}

fn record<T>(
    operation: &str,
    kind: ResourceKind,
    started: Instant,
    result: &Result<T, ProvisionError>,
) {
    metrics::record_operation(
        operation,
        kind.as_str(),
        result.is_ok(),
        started.elapsed().as_secs_f64(),
    );
}
