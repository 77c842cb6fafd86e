// services/cql-provisioner/src/manifest.rs
//
// Desired state as a user writes it. Field names follow the resource
// attributes the provisioner has always accepted; everything is converted
// into typed configs here, once, before any reconciler runs.
//

use std::collections::{BTreeMap, BTreeSet};
use std::fs;

use serde::{Deserialize, Serialize};
use svckit::errors::ProvisionError;

use crate::grant::{GrantConfig, GrantScope};
use crate::keyspace::KeyspaceConfig;
use crate::registry::Resource;
use crate::role::RoleConfig;
use crate::translator::ReplicationStrategy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    pub keyspaces: Vec<KeyspaceSpec>,
    pub roles: Vec<RoleSpec>,
    pub keyspace_grants: Vec<KeyspaceGrantSpec>,
    pub table_grants: Vec<TableGrantSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyspaceSpec {
    pub name: String,
    /// `SimpleStrategy` or `NetworkTopologyStrategy`
    pub replication_strategy: String,
    pub replication_factor: Option<u32>,
    #[serde(default)]
    pub datacenters: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleSpec {
    pub name: String,
    #[serde(default)]
    pub login: bool,
    #[serde(default)]
    pub superuser: bool,
    #[serde(default)]
    pub member_of: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyspaceGrantSpec {
    pub role: String,
    pub keyspace: String,
    pub permissions: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableGrantSpec {
    pub role: String,
    pub keyspace: String,
    pub table: String,
    pub permissions: BTreeSet<String>,
}

impl TryFrom<&KeyspaceSpec> for KeyspaceConfig {
    type Error = ProvisionError;

    fn try_from(spec: &KeyspaceSpec) -> Result<Self, Self::Error> {
        let replication_strategy = ReplicationStrategy::from_declared(
            &spec.replication_strategy,
            spec.replication_factor,
            &spec.datacenters,
        )
        .map_err(|e| match e {
            ProvisionError::ConfigError(msg) => {
                ProvisionError::ConfigError(format!("keyspace {}: {}", spec.name, msg))
            }
            other => other,
        })?;

        Ok(KeyspaceConfig {
            name: spec.name.clone(),
            replication_strategy,
        })
    }
}

impl From<&RoleSpec> for RoleConfig {
    fn from(spec: &RoleSpec) -> Self {
        RoleConfig {
            name: spec.name.clone(),
            can_login: spec.login,
            is_superuser: spec.superuser,
            member_of: spec.member_of.clone(),
        }
    }
}

impl From<&KeyspaceGrantSpec> for GrantConfig {
    fn from(spec: &KeyspaceGrantSpec) -> Self {
        GrantConfig {
            role: spec.role.clone(),
            scope: GrantScope::Keyspace {
                keyspace: spec.keyspace.clone(),
            },
            permissions: spec.permissions.clone(),
        }
    }
}

impl From<&TableGrantSpec> for GrantConfig {
    fn from(spec: &TableGrantSpec) -> Self {
        GrantConfig {
            role: spec.role.clone(),
            scope: GrantScope::Table {
                keyspace: spec.keyspace.clone(),
                table: spec.table.clone(),
            },
            permissions: spec.permissions.clone(),
        }
    }
}

impl Manifest {
    pub fn from_yaml(contents: &str) -> Result<Self, ProvisionError> {
        serde_yaml::from_str(contents)
            .map_err(|e| ProvisionError::ConfigError(format!("invalid manifest: {}", e)))
    }

    pub fn load(path: &str) -> Result<Self, ProvisionError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ProvisionError::ConfigError(format!("cannot read {}: {}", path, e)))?;
        Self::from_yaml(&contents)
    }

    /// Typed resources in apply order: roles, keyspaces, then grants.
    pub fn resources(&self) -> Result<Vec<Resource>, ProvisionError> {
        let mut resources = Vec::new();
        resources.extend(self.roles.iter().map(|r| Resource::Role(r.into())));
        for keyspace in &self.keyspaces {
            resources.push(Resource::Keyspace(KeyspaceConfig::try_from(keyspace)?));
        }
        resources.extend(self.keyspace_grants.iter().map(|g| Resource::Grant(g.into())));
        resources.extend(self.table_grants.iter().map(|g| Resource::Grant(g.into())));
        Ok(resources)
    }
}
