//! The execution gateway.

use crate::connector::{RowSink, WarehouseConnector};
use crate::error::GatewayError;
use crate::format::{CsvFileSink, ResultSet};
use cdw_policy::QueryValidator;
use cdw_query::QuerySpec;
use serde_json::json;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default rows fetched per round trip during export.
pub const DEFAULT_EXPORT_BATCH_SIZE: usize = 5000;

/// Outcome of an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: u64,
}

impl ExportSummary {
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "filepath": self.path.display().to_string(),
            "row_count": self.rows,
        })
    }
}

/// What an export left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written(ExportSummary),
    /// The statement had no result columns. No file is kept; callers
    /// report [`crate::NO_EXPORT_MESSAGE`].
    NoResults,
}


/// Validates, executes and releases. Holds no connection between calls.
#[derive(Clone)]
pub struct ExecutionGateway {
    connector: Arc<dyn WarehouseConnector>,
    validator: QueryValidator,
    export_batch_size: usize,
}

impl ExecutionGateway {
    pub fn new(connector: Arc<dyn WarehouseConnector>) -> Self {
        Self {
            connector,
            validator: QueryValidator::new(),
            export_batch_size: DEFAULT_EXPORT_BATCH_SIZE,
        }
    }

    pub fn with_export_batch_size(mut self, batch_size: usize) -> Self {
        self.export_batch_size = batch_size.max(1);
        self
    }

    /// Connection target for logs.
    pub fn target(&self) -> String {
        self.connector.target()
    }

    /// Run one statement and collect at most `spec.row_limit` rows.
    pub async fn execute(&self, spec: &QuerySpec) -> Result<ResultSet, GatewayError> {
        self.validator.validate(&spec.sql)?;
        tracing::info!(
            intent = spec.intent.as_ref().map(|i| i.kind.as_str()).unwrap_or("free_form"),
            row_limit = spec.row_limit,
            "Executing statement"
        );
        tracing::debug!(sql = %spec.sql, "Statement text");

        let mut result = ResultSet::default();
        let batch_size = usize::try_from(spec.row_limit)
            .unwrap_or(usize::MAX)
            .clamp(1, self.export_batch_size);
        let rows = self
            .run_once(&spec.sql, spec.row_limit, batch_size, &mut result)
            .await?;

        tracing::info!(rows, columns = result.columns.len(), "Statement complete");
        Ok(result)
    }

    /// Stream every row of a statement to a CSV file.
    ///
    /// The destination's parent directory must already exist; this is
    /// checked before a connection is opened. A statement with no result
    /// columns leaves no file.
    pub async fn export(&self, sql: &str, destination: &Path) -> Result<ExportOutcome, GatewayError> {
        self.validator.validate(sql)?;
        check_export_path(destination)?;
        tracing::info!(path = %destination.display(), "Exporting statement to CSV");

        let file = File::create(destination).map_err(|e| GatewayError::ExportWrite {
            path: destination.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut sink = CsvFileSink::new(BufWriter::new(file));

        let outcome = self
            .run_once(sql, u64::MAX, self.export_batch_size, &mut sink)
            .await;
        let outcome = outcome.and_then(|_| {
            let has_header = sink.has_header();
            sink.finish().map(|rows| has_header.then_some(rows))
        });

        match outcome {
            Ok(Some(rows)) => {
                tracing::info!(rows, path = %destination.display(), "Export complete");
                Ok(ExportOutcome::Written(ExportSummary {
                    path: destination.to_path_buf(),
                    rows,
                }))
            }
            Ok(None) => {
                tracing::info!(path = %destination.display(), "Statement returned no columns, nothing exported");
                remove_export(destination);
                Ok(ExportOutcome::NoResults)
            }
            Err(e) => {
                remove_export(destination);
                Err(e)
            }
        }
    }

    /// Open, run, close. The session is closed on every path.
    async fn run_once(
        &self,
        sql: &str,
        max_rows: u64,
        batch_size: usize,
        sink: &mut (dyn RowSink + Send),
    ) -> Result<u64, GatewayError> {
        let mut session = self.connector.connect().await.inspect_err(|e| {
            tracing::warn!(target_db = %self.connector.target(), error = %e, "Connection failed");
        })?;

        let outcome = session.run(sql, max_rows, batch_size, sink).await;

        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "Failed to close warehouse connection");
        }
        if let Err(e) = &outcome {
            tracing::warn!(error = %e, "Statement failed");
        }
        outcome
    }
}

fn remove_export(destination: &Path) {
    if let Err(e) = std::fs::remove_file(destination) {
        tracing::warn!(error = %e, "Could not remove export file");
    }
}

/// Reject destinations whose parent directory is missing.
pub fn check_export_path(destination: &Path) -> Result<(), GatewayError> {
    let parent = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if parent.is_dir() {
        Ok(())
    } else {
        Err(GatewayError::ExportPathInvalid(parent.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryConnector;
    use cdw_policy::ValidationErrorKind;

    fn cell(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    fn gateway(connector: &MemoryConnector) -> ExecutionGateway {
        ExecutionGateway::new(Arc::new(connector.clone()))
    }

    #[tokio::test]
    async fn test_execute_bounds_rows_and_closes() {
        let rows = (0..10).map(|i| vec![cell(&i.to_string())]).collect();
        let connector = MemoryConnector::new().with_rows("FROM t", ["n"], rows);
        let result = gateway(&connector)
            .execute(&QuerySpec::free_form("SELECT n FROM t", 3))
            .await
            .unwrap();

        assert_eq!(result.columns, vec!["n"]);
        assert_eq!(result.row_count(), 3);
        assert_eq!(connector.opened(), 1);
        assert_eq!(connector.closed(), 1);
    }

    #[tokio::test]
    async fn test_rejected_statement_never_connects() {
        let connector = MemoryConnector::new();
        let err = gateway(&connector)
            .execute(&QuerySpec::free_form("DELETE FROM PatientDim", 10))
            .await
            .unwrap_err();

        match err {
            GatewayError::Rejected(e) => {
                assert_eq!(e.kind, ValidationErrorKind::DisallowedLeadingKeyword)
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(connector.opened(), 0);
        assert!(connector.executed().is_empty());
    }

    #[tokio::test]
    async fn test_execution_failure_still_closes() {
        let connector = MemoryConnector::new().with_error("bogus", "column \"bogus\" does not exist");
        let err = gateway(&connector)
            .execute(&QuerySpec::free_form("SELECT bogus FROM t", 10))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::ExecutionFailure(ref m) if m.contains("bogus")));
        assert_eq!(connector.opened(), 1);
        assert_eq!(connector.closed(), 1);
    }

    #[tokio::test]
    async fn test_connection_failure_is_distinct() {
        let connector = MemoryConnector::new().refusing("connection refused");
        let err = gateway(&connector)
            .execute(&QuerySpec::free_form("SELECT 1", 10))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(connector.closed(), 0);
    }

    #[tokio::test]
    async fn test_statement_without_columns() {
        let connector = MemoryConnector::new();
        let result = gateway(&connector)
            .execute(&QuerySpec::free_form("SELECT 1", 10))
            .await
            .unwrap();
        assert!(result.has_no_columns());
        assert_eq!(result.render().unwrap(), crate::NO_RESULTS_MESSAGE);
    }

    #[tokio::test]
    async fn test_export_missing_directory_fails_before_connecting() {
        let connector = MemoryConnector::new();
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("missing").join("out.csv");

        let err = gateway(&connector)
            .export("SELECT 1", &destination)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ExportPathInvalid(_)));
        assert_eq!(connector.opened(), 0);
    }

    #[tokio::test]
    async fn test_export_streams_all_rows_in_batches() {
        let rows = (0..12)
            .map(|i| vec![cell(&i.to_string()), if i % 2 == 0 { None } else { cell("x,y") }])
            .collect();
        let connector = MemoryConnector::new().with_rows("FROM big", ["id", "val"], rows);
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("out.csv");

        let outcome = gateway(&connector)
            .with_export_batch_size(5)
            .export("SELECT id, val FROM big", &destination)
            .await
            .unwrap();

        let ExportOutcome::Written(summary) = outcome else {
            panic!("expected a written export, got {outcome:?}");
        };
        assert_eq!(summary.rows, 12);
        let written = std::fs::read_to_string(&destination).unwrap();
        let lines: Vec<_> = written.lines().collect();
        assert_eq!(lines.len(), 13);
        assert_eq!(lines[0], "id,val");
        assert_eq!(lines[1], "0,");
        assert_eq!(lines[2], "1,\"x,y\"");
        assert_eq!(connector.closed(), 1);
    }

    #[tokio::test]
    async fn test_export_without_columns_leaves_no_file() {
        let connector = MemoryConnector::new();
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("out.csv");

        let outcome = gateway(&connector)
            .export("SELECT FROM PatientDim WHERE false", &destination)
            .await
            .unwrap();
        assert_eq!(outcome, ExportOutcome::NoResults);
        assert!(!destination.exists());
        assert_eq!(connector.closed(), 1);
    }

    #[tokio::test]
    async fn test_export_with_columns_but_no_rows_keeps_header() {
        let connector = MemoryConnector::new().with_rows("FROM t", ["n"], vec![]);
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("out.csv");

        let outcome = gateway(&connector)
            .export("SELECT n FROM t WHERE false", &destination)
            .await
            .unwrap();
        assert!(matches!(outcome, ExportOutcome::Written(ref s) if s.rows == 0));
        assert_eq!(std::fs::read_to_string(&destination).unwrap(), "n\n");
    }

    #[tokio::test]
    async fn test_failed_export_removes_partial_file() {
        let connector = MemoryConnector::new().with_error("FROM t", "permission denied");
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("out.csv");

        let err = gateway(&connector)
            .export("SELECT * FROM t", &destination)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ExecutionFailure(_)));
        assert!(!destination.exists());
        assert_eq!(connector.closed(), 1);
    }

    #[test]
    fn test_check_export_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_export_path(&dir.path().join("a.csv")).is_ok());
        assert!(check_export_path(Path::new("relative.csv")).is_ok());
        assert!(check_export_path(&dir.path().join("nope/a.csv")).is_err());
    }
}
