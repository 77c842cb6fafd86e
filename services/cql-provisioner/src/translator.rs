// services/cql-provisioner/src/translator.rs
//
// Pure conversions between typed configuration and CQL text / metadata rows.
// Nothing in this module talks to the cluster.
//

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use svckit::config::SystemKeyspaces;
use svckit::errors::ProvisionError;
use svckit::types::RowData;
use tracing::debug;

use crate::keyspace::KeyspaceConfig;

pub const SIMPLE_STRATEGY: &str = "SimpleStrategy";
pub const NETWORK_TOPOLOGY_STRATEGY: &str = "NetworkTopologyStrategy";

const CLASS_KEY: &str = "class";
const REPLICATION_FACTOR_KEY: &str = "replication_factor";

/// How many copies of a keyspace are kept, and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplicationStrategy {
    Simple { factor: u32 },
    /// Replication factor per datacenter name.
    NetworkTopology { datacenters: BTreeMap<String, u32> },
}

impl ReplicationStrategy {
    pub fn class_name(&self) -> &'static str {
        match self {
            ReplicationStrategy::Simple { .. } => SIMPLE_STRATEGY,
            ReplicationStrategy::NetworkTopology { .. } => NETWORK_TOPOLOGY_STRATEGY,
        }
    }

    /// Build a strategy from the loosely typed fields a user declares.
    ///
    /// `tag` may be the short class name or a fully qualified one; only the
    /// last dotted segment is looked at.
    pub fn from_declared(
        tag: &str,
        factor: Option<u32>,
        datacenters: &BTreeMap<String, u32>,
    ) -> Result<Self, ProvisionError> {
        match strategy_tag(tag) {
            SIMPLE_STRATEGY => {
                if !datacenters.is_empty() {
                    return Err(ProvisionError::ConfigError(format!(
                        "{} does not take datacenters",
                        SIMPLE_STRATEGY
                    )));
                }
                factor
                    .map(|factor| ReplicationStrategy::Simple { factor })
                    .ok_or_else(|| {
                        ProvisionError::ConfigError(format!(
                            "{} requires replication_factor",
                            SIMPLE_STRATEGY
                        ))
                    })
            }
            NETWORK_TOPOLOGY_STRATEGY => {
                if factor.is_some() {
                    return Err(ProvisionError::ConfigError(format!(
                        "{} takes per-datacenter factors, not replication_factor",
                        NETWORK_TOPOLOGY_STRATEGY
                    )));
                }
                Ok(ReplicationStrategy::NetworkTopology {
                    datacenters: datacenters.clone(),
                })
            }
            other => Err(ProvisionError::ConfigError(format!(
                "Invalid replication strategy {:?}",
                other
            ))),
        }
    }

    /// Key/value pairs of the `replication` map, class first, datacenters in name order.
    pub fn to_replication_map(&self) -> Vec<(String, String)> {
        let mut pairs = vec![(CLASS_KEY.to_string(), self.class_name().to_string())];
        match self {
            ReplicationStrategy::Simple { factor } => {
                pairs.push((REPLICATION_FACTOR_KEY.to_string(), factor.to_string()));
            }
            ReplicationStrategy::NetworkTopology { datacenters } => {
                pairs.extend(datacenters.iter().map(|(dc, rf)| (dc.clone(), rf.to_string())));
            }
        }
        pairs
    }

    /// Inverse of [`to_replication_map`](Self::to_replication_map), reading the map
    /// the cluster stores in `system_schema.keyspaces.replication`.
    pub fn from_replication_map(map: &BTreeMap<String, String>) -> Result<Self, ProvisionError> {
        let class = map.get(CLASS_KEY).ok_or_else(|| {
            ProvisionError::InvalidMetadata("replication map has no class entry".to_string())
        })?;

        match strategy_tag(class) {
            SIMPLE_STRATEGY => {
                let factor = map.get(REPLICATION_FACTOR_KEY).ok_or_else(|| {
                    ProvisionError::InvalidMetadata(format!(
                        "{} without {}",
                        SIMPLE_STRATEGY, REPLICATION_FACTOR_KEY
                    ))
                })?;
                Ok(ReplicationStrategy::Simple {
                    factor: parse_factor(REPLICATION_FACTOR_KEY, factor)?,
                })
            }
            NETWORK_TOPOLOGY_STRATEGY => {
                let datacenters = map
                    .iter()
                    .filter(|(key, _)| key.as_str() != CLASS_KEY)
                    .map(|(dc, rf)| Ok((dc.clone(), parse_factor(dc, rf)?)))
                    .collect::<Result<BTreeMap<_, _>, ProvisionError>>()?;
                Ok(ReplicationStrategy::NetworkTopology { datacenters })
            }
            _ => Err(ProvisionError::UnsupportedStrategy(class.clone())),
        }
    }
}

/// Last segment of a dotted strategy class, e.g.
/// `org.apache.cassandra.locator.SimpleStrategy` -> `SimpleStrategy`.
pub fn strategy_tag(class: &str) -> &str {
    class.rsplit('.').next().unwrap_or(class)
}

fn parse_factor(key: &str, value: &str) -> Result<u32, ProvisionError> {
    value.trim().parse().map_err(|_| {
        ProvisionError::InvalidMetadata(format!(
            "replication factor for {} is not a number: {:?}",
            key, value
        ))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyspaceVerb {
    Create,
    Alter,
}

impl fmt::Display for KeyspaceVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyspaceVerb::Create => f.write_str("CREATE"),
            KeyspaceVerb::Alter => f.write_str("ALTER"),
        }
    }
}

/// DDL cannot bind identifiers, so names are checked before interpolation.
///
/// Unquoted identifiers are folded to lowercase by the server, and metadata
/// lookups compare names exactly, so uppercase letters are rejected.
pub fn validate_identifier(kind: &str, name: &str) -> Result<(), ProvisionError> {
    let valid = !name.is_empty()
        && name.len() <= 48
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ProvisionError::ConfigError(format!(
            "invalid {} name {:?}: expected 1-48 lowercase letters, digits or underscores",
            kind, name
        )))
    }
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `CREATE|ALTER KEYSPACE <name> WITH replication = {...} AND durable_writes = true;`
pub fn build_keyspace_statement(
    config: &KeyspaceConfig,
    verb: KeyspaceVerb,
) -> Result<String, ProvisionError> {
    validate_identifier("keyspace", &config.name)?;

    let replication = config
        .replication_strategy
        .to_replication_map()
        .iter()
        .map(|(key, value)| format!("{}: {}", quote_literal(key), quote_literal(value)))
        .collect::<Vec<_>>()
        .join(", ");

    let stmt = format!(
        "{} KEYSPACE {} WITH replication = {{{} }} AND durable_writes = true;",
        verb, config.name, replication
    );
    debug!("Built keyspace statement: {}", stmt);
    Ok(stmt)
}

pub fn build_drop_keyspace_statement(name: &str) -> Result<String, ProvisionError> {
    validate_identifier("keyspace", name)?;
    Ok(format!("DROP KEYSPACE {};", name))
}

/// Parse a `system_schema.keyspaces` row (`keyspace_name`, `replication`).
pub fn parse_keyspace_metadata(row: &RowData) -> Result<KeyspaceConfig, ProvisionError> {
    let name = row.text("keyspace_name")?;
    let replication = row.text_map("replication")?;
    Ok(KeyspaceConfig {
        name,
        replication_strategy: ReplicationStrategy::from_replication_map(&replication)?,
    })
}

/// Parameterized statements against the cluster's metadata tables.
#[derive(Debug, Clone)]
pub struct MetadataStatements {
    system: SystemKeyspaces,
}

impl MetadataStatements {
    pub fn new(system: SystemKeyspaces) -> Self {
        Self { system }
    }

    pub fn select_keyspace(&self) -> String {
        format!(
            "SELECT keyspace_name, replication FROM {}.keyspaces WHERE keyspace_name = ?",
            self.system.schema
        )
    }

    pub fn select_role(&self) -> String {
        format!(
            "SELECT role, can_login, is_superuser, member_of FROM {}.roles WHERE role = ?",
            self.system.auth
        )
    }

    pub fn upsert_role(&self) -> String {
        format!(
            "INSERT INTO {}.roles (role, can_login, is_superuser, member_of) VALUES (?, ?, ?, ?)",
            self.system.auth
        )
    }

    pub fn delete_role(&self) -> String {
        format!("DELETE FROM {}.roles WHERE role = ?", self.system.auth)
    }

    pub fn select_grant(&self) -> String {
        format!(
            "SELECT role, resource, permissions FROM {}.role_permissions \
             WHERE role = ? AND resource = ?",
            self.system.auth
        )
    }

    pub fn upsert_grant(&self) -> String {
        format!(
            "INSERT INTO {}.role_permissions (role, resource, permissions) VALUES (?, ?, ?)",
            self.system.auth
        )
    }

    pub fn delete_grant(&self) -> String {
        format!(
            "DELETE FROM {}.role_permissions WHERE role = ? AND resource = ?",
            self.system.auth
        )
    }
}

impl Default for MetadataStatements {
    fn default() -> Self {
        Self::new(SystemKeyspaces::default())
    }
}
