// In-memory stand-in for a cluster: the three metadata tables plus the
// keyspace DDL the reconcilers issue. Error messages mirror the server's.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use svckit::database::SessionGateway;
use svckit::errors::GatewayError;
use svckit::types::{ColumnValue, RowData};

const LOCATOR_PACKAGE: &str = "org.apache.cassandra.locator.";

#[derive(Default)]
struct State {
    keyspaces: BTreeMap<String, BTreeMap<String, String>>,
    roles: BTreeMap<String, (bool, bool, ColumnValue)>,
    permissions: BTreeMap<(String, String), ColumnValue>,
}

#[derive(Default)]
pub struct InMemoryCluster {
    state: Mutex<State>,
    log: Mutex<Vec<String>>,
    /// Injected failures keyed by call number (0 = first call ever made).
    failures: Mutex<BTreeMap<usize, GatewayError>>,
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every statement executed or fetched, in order.
    pub fn statements(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// Make the next call fail with `err` without touching state.
    pub fn fail_next(&self, err: GatewayError) {
        self.fail_nth(0, err);
    }

    /// Make the call `n` places after the next one fail with `err`; earlier
    /// calls run normally.
    pub fn fail_nth(&self, n: usize, err: GatewayError) {
        let at = self.log.lock().unwrap().len() + n;
        self.failures.lock().unwrap().insert(at, err);
    }

    /// Store a replication map as-is, bypassing DDL.
    pub fn seed_keyspace(&self, name: &str, replication: &[(&str, &str)]) {
        let map = replication
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.state.lock().unwrap().keyspaces.insert(name.to_string(), map);
    }

    pub fn keyspace_replication(&self, name: &str) -> Option<BTreeMap<String, String>> {
        self.state.lock().unwrap().keyspaces.get(name).cloned()
    }

    fn begin(&self, statement: &str) -> Result<(), GatewayError> {
        let call = {
            let mut log = self.log.lock().unwrap();
            log.push(statement.to_string());
            log.len() - 1
        };
        match self.failures.lock().unwrap().remove(&call) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn text(values: &[ColumnValue], idx: usize) -> String {
    match values.get(idx) {
        Some(ColumnValue::Text(s)) => s.clone(),
        other => panic!("parameter {} is not text: {:?}", idx, other),
    }
}

fn boolean(values: &[ColumnValue], idx: usize) -> bool {
    match values.get(idx) {
        Some(ColumnValue::Boolean(b)) => *b,
        other => panic!("parameter {} is not boolean: {:?}", idx, other),
    }
}

/// Empty collections are stored as null.
fn collection(values: &[ColumnValue], idx: usize) -> ColumnValue {
    match values.get(idx) {
        Some(ColumnValue::Set(items)) if items.is_empty() => ColumnValue::Null,
        Some(value) => value.clone(),
        None => ColumnValue::Null,
    }
}

fn parse_replication(statement: &str) -> BTreeMap<String, String> {
    let open = statement.find('{').expect("replication map opens");
    let close = statement.rfind('}').expect("replication map closes");
    statement[open + 1..close]
        .split(',')
        .filter_map(|pair| {
            let (key, value) = pair.split_once(':')?;
            let unquote = |s: &str| s.trim().trim_matches('\'').replace("''", "'");
            Some((unquote(key), unquote(value)))
        })
        .map(|(key, value)| {
            if key == "class" {
                (key, format!("{}{}", LOCATOR_PACKAGE, value))
            } else {
                (key, value)
            }
        })
        .collect()
}

fn keyspace_name(statement: &str) -> String {
    statement
        .split_whitespace()
        .nth(2)
        .expect("keyspace name")
        .trim_end_matches(';')
        .to_string()
}

#[async_trait]
impl SessionGateway for InMemoryCluster {
    async fn execute(&self, statement: &str, values: Vec<ColumnValue>) -> Result<(), GatewayError> {
        self.begin(statement)?;
        let mut state = self.state.lock().unwrap();

        if statement.starts_with("CREATE KEYSPACE ") {
            let name = keyspace_name(statement);
            if state.keyspaces.contains_key(&name) {
                let message = format!("Keyspace {} already exists", name);
                return Err(GatewayError::AlreadyExists(message));
            }
            state.keyspaces.insert(name, parse_replication(statement));
        } else if statement.starts_with("ALTER KEYSPACE ") {
            let name = keyspace_name(statement);
            match state.keyspaces.get_mut(&name) {
                Some(existing) => *existing = parse_replication(statement),
                None => {
                    return Err(GatewayError::DatabaseError(format!(
                        "Cannot alter non existing keyspace '{}'.",
                        name
                    )))
                }
            }
        } else if statement.starts_with("DROP KEYSPACE ") {
            let name = keyspace_name(statement);
            if state.keyspaces.remove(&name).is_none() {
                return Err(GatewayError::DatabaseError(format!(
                    "Cannot drop non existing keyspace '{}'.",
                    name
                )));
            }
        } else if statement.contains(".role_permissions") {
            let key = (text(&values, 0), text(&values, 1));
            if statement.starts_with("INSERT") {
                state.permissions.insert(key, collection(&values, 2));
            } else if statement.starts_with("DELETE") {
                state.permissions.remove(&key);
            } else {
                panic!("unexpected statement: {}", statement);
            }
        } else if statement.contains(".roles") {
            let name = text(&values, 0);
            if statement.starts_with("INSERT") {
                let row = (boolean(&values, 1), boolean(&values, 2), collection(&values, 3));
                state.roles.insert(name, row);
            } else if statement.starts_with("DELETE") {
                state.roles.remove(&name);
            } else {
                panic!("unexpected statement: {}", statement);
            }
        } else {
            panic!("unexpected statement: {}", statement);
        }
        Ok(())
    }

    async fn fetch_one(
        &self,
        statement: &str,
        values: Vec<ColumnValue>,
    ) -> Result<Option<RowData>, GatewayError> {
        self.begin(statement)?;
        let state = self.state.lock().unwrap();

        if statement.contains(".keyspaces") {
            let name = text(&values, 0);
            Ok(state.keyspaces.get(&name).map(|replication| {
                let map: HashMap<String, ColumnValue> = replication
                    .iter()
                    .map(|(k, v)| (k.clone(), ColumnValue::text(v.as_str())))
                    .collect();
                RowData::new()
                    .with("keyspace_name", ColumnValue::text(name.as_str()))
                    .with("replication", ColumnValue::Map(map))
            }))
        } else if statement.contains(".role_permissions") {
            let role = text(&values, 0);
            let resource = text(&values, 1);
            Ok(state
                .permissions
                .get(&(role.clone(), resource.clone()))
                .map(|permissions| {
                    RowData::new()
                        .with("role", ColumnValue::text(role.as_str()))
                        .with("resource", ColumnValue::text(resource.as_str()))
                        .with("permissions", permissions.clone())
                }))
        } else if statement.contains(".roles") {
            let name = text(&values, 0);
            Ok(state.roles.get(&name).map(|(login, superuser, member_of)| {
                RowData::new()
                    .with("role", ColumnValue::text(name.as_str()))
                    .with("can_login", ColumnValue::Boolean(*login))
                    .with("is_superuser", ColumnValue::Boolean(*superuser))
                    .with("member_of", member_of.clone())
            }))
        } else {
            panic!("unexpected query: {}", statement);
        }
    }

    fn driver_name(&self) -> &str {
        "in-memory"
    }
}
