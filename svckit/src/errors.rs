use scylla::transport::errors::{DbError, NewSessionError, QueryError};
use thiserror::Error;

/// Failure reported by a [`SessionGateway`](crate::database::SessionGateway).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("object already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),
}

impl From<QueryError> for GatewayError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::DbError(DbError::AlreadyExists { .. }, message) => {
                GatewayError::AlreadyExists(message)
            }
            QueryError::DbError(_, message) => GatewayError::DatabaseError(message),
            QueryError::IoError(e) => GatewayError::ConnectionError(e.to_string()),
            QueryError::RequestTimeout(message) => GatewayError::ConnectionError(message),
            other => GatewayError::DatabaseError(other.to_string()),
        }
    }
}

impl From<NewSessionError> for GatewayError {
    fn from(err: NewSessionError) -> Self {
        GatewayError::ConnectionError(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unsupported replication strategy retrieved from the database: {0}")]
    UnsupportedStrategy(String),

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("{statement} ({params}): not found")]
    NotFound { statement: String, params: String },

    #[error("{statement} ({params}): {source}")]
    Statement {
        statement: String,
        params: String,
        source: GatewayError,
    },
}

impl ProvisionError {
    pub fn not_found(statement: &str, params: &[&str]) -> Self {
        ProvisionError::NotFound {
            statement: statement.to_string(),
            params: params.join(", "),
        }
    }

    pub fn statement(statement: &str, params: &[&str], source: GatewayError) -> Self {
        ProvisionError::Statement {
            statement: statement.to_string(),
            params: params.join(", "),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProvisionError::NotFound { .. })
    }

    /// Driver error underneath a failed statement, if any.
    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            ProvisionError::Statement { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_exists_is_classified() {
        let err = QueryError::DbError(
            DbError::AlreadyExists {
                keyspace: "ks1".to_string(),
                table: String::new(),
            },
            "Keyspace ks1 already exists".to_string(),
        );
        assert_eq!(
            GatewayError::from(err),
            GatewayError::AlreadyExists("Keyspace ks1 already exists".to_string())
        );
    }

    #[test]
    fn test_server_message_is_preserved() {
        let err = QueryError::DbError(
            DbError::ConfigError,
            "Cannot drop non existing keyspace 'ks1'.".to_string(),
        );
        let gateway = GatewayError::from(err);
        assert!(gateway.to_string().contains("Cannot drop non existing keyspace"));
    }

    #[test]
    fn test_statement_error_carries_context() {
        let err = ProvisionError::statement(
            "DELETE FROM system_auth.roles WHERE role = ?",
            &["app"],
            GatewayError::ConnectionError("broken pipe".to_string()),
        );
        let message = err.to_string();
        assert!(message.starts_with("DELETE FROM system_auth.roles WHERE role = ? (app)"));
        assert!(message.contains("broken pipe"));
        assert!(err.gateway_error().is_some());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_joins_params() {
        let err = ProvisionError::not_found("SELECT ...", &["app", "data/ks1"]);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "SELECT ... (app, data/ks1): not found");
    }
}
