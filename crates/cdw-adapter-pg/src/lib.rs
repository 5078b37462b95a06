//! # cdw-adapter-pg
//!
//! The execution gateway. Every call validates its statement, opens a fresh
//! connection, runs exactly one statement, retrieves a bounded number of
//! rows and closes the connection again, whatever the outcome.
//!
//! Connections come from a [`WarehouseConnector`]: [`PgConnector`] talks to
//! the warehouse through sqlx, [`MemoryConnector`] serves canned rows for
//! tests and offline use.

pub mod connector;
pub mod error;
pub mod format;
pub mod gateway;
pub mod memory;
pub mod postgres;

pub use connector::{RowSink, WarehouseConnector, WarehouseSession};
pub use error::GatewayError;
pub use format::{CsvFileSink, NO_EXPORT_MESSAGE, NO_RESULTS_MESSAGE, ResultSet, Row};
pub use gateway::{ExecutionGateway, ExportOutcome, ExportSummary};
pub use memory::MemoryConnector;
pub use postgres::PgConnector;
