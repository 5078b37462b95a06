//! Connection seams between the gateway and a warehouse driver.

use crate::error::GatewayError;
use crate::format::Row;
use async_trait::async_trait;

/// Opens one connection per call.
#[async_trait]
pub trait WarehouseConnector: Send + Sync {
    /// Open a new session. Sessions are never pooled or shared.
    async fn connect(&self) -> Result<Box<dyn WarehouseSession>, GatewayError>;

    /// Connection target for logs (no credentials).
    fn target(&self) -> String;
}

/// A single open connection.
#[async_trait]
pub trait WarehouseSession: Send {
    /// Execute `sql`, report its columns to `sink` (even when no rows come
    /// back), then hand over rows in batches of at most `batch_size`,
    /// stopping after `max_rows`. Returns the number of rows delivered.
    async fn run(
        &mut self,
        sql: &str,
        max_rows: u64,
        batch_size: usize,
        sink: &mut (dyn RowSink + Send),
    ) -> Result<u64, GatewayError>;

    /// Release the connection.
    async fn close(self: Box<Self>) -> Result<(), GatewayError>;
}

/// Receives a result set as it streams in.
pub trait RowSink {
    fn columns(&mut self, columns: &[String]) -> Result<(), GatewayError>;

    fn rows(&mut self, rows: Vec<Row>) -> Result<(), GatewayError>;
}
