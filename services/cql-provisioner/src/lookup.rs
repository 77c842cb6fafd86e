use svckit::database::SessionGateway;
use svckit::errors::ProvisionError;
use svckit::types::{ColumnValue, RowData};

/// Result of a successful create-or-update: the key the host tracks the
/// resource by, and the state observed right after the write.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled<T> {
    pub key: String,
    pub observed: T,
}

/// Point lookup shared by every `read` and `exists`.
///
/// A missing row becomes [`ProvisionError::NotFound`]; driver failures are
/// wrapped with the statement and its parameters.
pub async fn lookup_row(
    session: &dyn SessionGateway,
    statement: &str,
    params: &[&str],
) -> Result<RowData, ProvisionError> {
    let values = params.iter().map(|p| ColumnValue::text(*p)).collect();
    match session.fetch_one(statement, values).await {
        Ok(Some(row)) => Ok(row),
        Ok(None) => Err(ProvisionError::not_found(statement, params)),
        Err(e) => Err(ProvisionError::statement(statement, params, e)),
    }
}

/// Answer of an `exists` call. `error` is set whenever `exists` is false.
#[derive(Debug)]
pub struct Existence {
    pub exists: bool,
    pub error: Option<ProvisionError>,
}

impl Existence {
    pub fn from_lookup<T>(result: Result<T, ProvisionError>) -> Self {
        match result {
            Ok(_) => Self {
                exists: true,
                error: None,
            },
            Err(err) => Self {
                exists: false,
                error: Some(err),
            },
        }
    }

    /// True only when the lookup succeeded and found no row, as opposed to
    /// a lookup that could not be completed.
    pub fn is_definitely_absent(&self) -> bool {
        !self.exists && self.error.as_ref().is_some_and(ProvisionError::is_not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use svckit::errors::GatewayError;

    #[test]
    fn test_existence_from_found() {
        let existence = Existence::from_lookup::<()>(Ok(()));
        assert!(existence.exists);
        assert!(existence.error.is_none());
        assert!(!existence.is_definitely_absent());
    }

    #[test]
    fn test_existence_distinguishes_absent_from_unknown() {
        let absent = Existence::from_lookup::<()>(Err(ProvisionError::not_found("SELECT", &["x"])));
        assert!(!absent.exists);
        assert!(absent.is_definitely_absent());

        let unknown = Existence::from_lookup::<()>(Err(ProvisionError::statement(
            "SELECT",
            &["x"],
            GatewayError::ConnectionError("timed out".to_string()),
        )));
        assert!(!unknown.exists);
        assert!(!unknown.is_definitely_absent());
    }
}
