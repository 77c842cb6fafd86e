use async_trait::async_trait;

use crate::errors::GatewayError;
use crate::types::{ColumnValue, RowData};

/// One live session to the cluster, shared by every reconciler.
///
/// Statements are executed with positional `?` parameters. Implementations
/// must be safe to call from several tasks at once; the reconcilers hold no
/// locks of their own.
#[async_trait]
pub trait SessionGateway: Send + Sync {
    /// Execute a statement and discard any rows it returns.
    async fn execute(&self, statement: &str, values: Vec<ColumnValue>) -> Result<(), GatewayError>;

    /// Execute a statement and return its first row, if there is one.
    async fn fetch_one(
        &self,
        statement: &str,
        values: Vec<ColumnValue>,
    ) -> Result<Option<RowData>, GatewayError>;

    fn driver_name(&self) -> &str;
}
