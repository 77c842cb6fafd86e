use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use openssl::ssl::{SslContext, SslMethod, SslVerifyMode};
use scylla::frame::response::result::CqlValue;
use scylla::transport::execution_profile::ExecutionProfile;
use scylla::transport::session::PoolSize;
use scylla::{Session, SessionBuilder};
use tracing::{debug, error, info};

use crate::config::{DatabaseConfig, TlsConfig};
use crate::database::gateway::SessionGateway;
use crate::errors::GatewayError;
use crate::types::{ColumnValue, RowData};

/// ScyllaDB / Cassandra session wrapper
#[derive(Clone)]
pub struct ScyllaConnection {
    session: Arc<Session>,
    driver_name: String,
}

impl ScyllaConnection {
    /// Connect to the cluster described by `config`
    pub async fn new(config: &DatabaseConfig, driver_name: &str) -> Result<Self, GatewayError> {
        info!("Connecting to {} cluster: {:?}", driver_name, config.hosts);

        let contact_points = config.contact_points();

        let pool_size = NonZeroUsize::new(config.pool_size as usize).unwrap_or(NonZeroUsize::MIN);

        let profile = ExecutionProfile::builder()
            .consistency(config.consistency.into())
            .request_timeout(Some(config.request_timeout()))
            .build();

        let mut session_builder = SessionBuilder::new()
            .known_nodes(&contact_points)
            .connection_timeout(config.connection_timeout())
            .pool_size(PoolSize::PerShard(pool_size))
            .default_execution_profile_handle(profile.into_handle());

        if let (Some(ref username), Some(ref password)) = (&config.username, &config.password) {
            session_builder = session_builder.user(username, password);
        }

        if let Some(context) = ssl_context(&config.tls)? {
            info!("Using TLS for {} connections", driver_name);
            session_builder = session_builder.ssl_context(Some(context));
        }

        let session = session_builder.build().await.map_err(|e| {
            error!("Failed to connect to {}: {}", driver_name, e);
            GatewayError::from(e)
        })?;

        info!("Successfully connected to {} cluster", driver_name);

        Ok(Self {
            session: Arc::new(session),
            driver_name: driver_name.to_string(),
        })
    }
}

fn ssl_context(tls: &TlsConfig) -> Result<Option<SslContext>, GatewayError> {
    if !tls.enabled {
        return Ok(None);
    }

    let tls_error = |e: openssl::error::ErrorStack| {
        GatewayError::ConnectionError(format!("TLS setup failed: {}", e))
    };
    let mut builder = SslContext::builder(SslMethod::tls()).map_err(tls_error)?;
    if let Some(ref ca_file) = tls.ca_file {
        builder.set_ca_file(ca_file).map_err(tls_error)?;
    }
    builder.set_verify(if tls.verify_peer {
        SslVerifyMode::PEER
    } else {
        SslVerifyMode::NONE
    });
    Ok(Some(builder.build()))
}

#[async_trait]
impl SessionGateway for ScyllaConnection {
    async fn execute(&self, statement: &str, values: Vec<ColumnValue>) -> Result<(), GatewayError> {
        debug!("Executing: {}", statement);
        let values: Vec<Option<CqlValue>> = values.iter().map(to_cql_value).collect();
        self.session.query_unpaged(statement, values).await?;
        Ok(())
    }

    async fn fetch_one(
        &self,
        statement: &str,
        values: Vec<ColumnValue>,
    ) -> Result<Option<RowData>, GatewayError> {
        debug!("Fetching: {}", statement);
        let values: Vec<Option<CqlValue>> = values.iter().map(to_cql_value).collect();
        let result = self.session.query_unpaged(statement, values).await?;

        let names: Vec<String> = result.col_specs().iter().map(|spec| spec.name.clone()).collect();
        let first = result.rows.unwrap_or_default().into_iter().next();

        Ok(first.map(|row| RowData {
            columns: names
                .into_iter()
                .zip(row.columns)
                .map(|(name, value)| (name, value.map(from_cql_value).unwrap_or(ColumnValue::Null)))
                .collect(),
        }))
    }

    fn driver_name(&self) -> &str {
        &self.driver_name
    }
}

/// Convert a parameter into the driver's value type. `Null` binds as CQL null.
fn to_cql_value(value: &ColumnValue) -> Option<CqlValue> {
    match value {
        ColumnValue::Text(s) => Some(CqlValue::Text(s.clone())),
        ColumnValue::Int(i) => Some(CqlValue::Int(*i)),
        ColumnValue::BigInt(i) => Some(CqlValue::BigInt(*i)),
        ColumnValue::Boolean(b) => Some(CqlValue::Boolean(*b)),
        ColumnValue::List(items) => Some(CqlValue::List(
            items.iter().filter_map(to_cql_value).collect(),
        )),
        ColumnValue::Set(items) => Some(CqlValue::Set(
            items.iter().filter_map(to_cql_value).collect(),
        )),
        ColumnValue::Map(entries) => Some(CqlValue::Map(
            entries
                .iter()
                .filter_map(|(k, v)| to_cql_value(v).map(|v| (CqlValue::Text(k.clone()), v)))
                .collect(),
        )),
        ColumnValue::Null => None,
    }
}

fn from_cql_value(value: CqlValue) -> ColumnValue {
    match value {
        CqlValue::Text(s) | CqlValue::Ascii(s) => ColumnValue::Text(s),
        CqlValue::Int(i) => ColumnValue::Int(i),
        CqlValue::BigInt(i) => ColumnValue::BigInt(i),
        CqlValue::Boolean(b) => ColumnValue::Boolean(b),
        CqlValue::List(items) => ColumnValue::List(items.into_iter().map(from_cql_value).collect()),
        CqlValue::Set(items) => ColumnValue::Set(items.into_iter().map(from_cql_value).collect()),
        CqlValue::Map(entries) => {
            let map: HashMap<String, ColumnValue> = entries
                .into_iter()
                .filter_map(|(k, v)| match k {
                    CqlValue::Text(k) | CqlValue::Ascii(k) => Some((k, from_cql_value(v))),
                    _ => None,
                })
                .collect();
            ColumnValue::Map(map)
        }
        _ => ColumnValue::Null,
    }
}
