//! sqlx-backed connector.

use crate::connector::{RowSink, WarehouseConnector, WarehouseSession};
use crate::error::{GatewayError, redact};
use crate::format::Row;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use cdw_core::{SslMode, WarehouseConfig};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use futures::TryStreamExt;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow, PgSslMode, PgValueFormat};
use sqlx::{Column, Connection, Executor, Row as _, Statement, TypeInfo, ValueRef};

/// Opens a fresh [`PgConnection`] per call. No pooling.
#[derive(Clone)]
pub struct PgConnector {
    options: PgConnectOptions,
    target: String,
    password: Option<String>,
}

impl std::fmt::Debug for PgConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgConnector")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl PgConnector {
    /// Build connection options from configuration.
    ///
    /// Sessions run with the warehouse schema as `search_path`, the
    /// configured application name and, when set, a statement timeout.
    pub fn from_config(config: &WarehouseConfig) -> Result<Self, GatewayError> {
        let target = config.display_target();
        let missing = config.missing_fields();
        if !missing.is_empty() {
            return Err(GatewayError::connection(
                target,
                format!("missing configuration: {}", missing.join(", ")),
            ));
        }

        let password = config.resolved_password();
        let mut options = PgConnectOptions::new()
            .host(config.host.as_deref().unwrap_or_default())
            .port(config.port)
            .database(config.database.as_deref().unwrap_or_default())
            .username(config.username.as_deref().unwrap_or_default())
            .ssl_mode(ssl_mode(config.ssl_mode))
            .application_name(&config.application_name);
        if let Some(password) = &password {
            options = options.password(password);
        }

        let mut session_options = vec![("search_path".to_string(), config.schema.clone())];
        if let Some(seconds) = config.statement_timeout_seconds {
            session_options.push(("statement_timeout".to_string(), format!("{}s", seconds)));
        }
        options = options.options(session_options);

        Ok(Self {
            options,
            target,
            password,
        })
    }
}

fn ssl_mode(mode: SslMode) -> PgSslMode {
    match mode {
        SslMode::Disable => PgSslMode::Disable,
        SslMode::Allow => PgSslMode::Allow,
        SslMode::Prefer => PgSslMode::Prefer,
        SslMode::Require => PgSslMode::Require,
        SslMode::VerifyCa => PgSslMode::VerifyCa,
        SslMode::VerifyFull => PgSslMode::VerifyFull,
    }
}

#[async_trait]
impl WarehouseConnector for PgConnector {
    async fn connect(&self) -> Result<Box<dyn WarehouseSession>, GatewayError> {
        let conn = PgConnection::connect_with(&self.options)
            .await
            .map_err(|e| {
                GatewayError::connection(
                    self.target.clone(),
                    redact(&e.to_string(), self.password.as_deref()),
                )
            })?;
        tracing::debug!(target_db = %self.target, "Opened warehouse connection");
        Ok(Box::new(PgSession {
            conn,
            password: self.password.clone(),
        }))
    }

    fn target(&self) -> String {
        self.target.clone()
    }
}

struct PgSession {
    conn: PgConnection,
    password: Option<String>,
}

impl PgSession {
    fn failure(&self, error: sqlx::Error) -> GatewayError {
        GatewayError::execution(redact(&error.to_string(), self.password.as_deref()))
    }
}

#[async_trait]
impl WarehouseSession for PgSession {
    async fn run(
        &mut self,
        sql: &str,
        max_rows: u64,
        batch_size: usize,
        sink: &mut (dyn RowSink + Send),
    ) -> Result<u64, GatewayError> {
        // Prepare first so column names are known even for empty results.
        let statement = match (&mut self.conn).prepare(sql).await {
            Ok(statement) => statement,
            Err(e) => return Err(self.failure(e)),
        };
        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        sink.columns(&columns)?;

        if columns.is_empty() {
            let outcome = statement.query().execute(&mut self.conn).await;
            return outcome.map(|_| 0).map_err(|e| self.failure(e));
        }

        let batch_size = batch_size.max(1);
        let mut delivered = 0u64;
        let mut batch: Vec<Row> = Vec::with_capacity(batch_size);
        let mut failure = None;
        {
            let mut rows = statement.query().fetch(&mut self.conn);
            while delivered < max_rows {
                match rows.try_next().await {
                    Ok(Some(row)) => {
                        batch.push(render_row(&row, columns.len()));
                        delivered += 1;
                        if batch.len() == batch_size {
                            sink.rows(std::mem::replace(
                                &mut batch,
                                Vec::with_capacity(batch_size),
                            ))?;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
        }
        if let Some(e) = failure {
            return Err(self.failure(e));
        }
        if !batch.is_empty() {
            sink.rows(batch)?;
        }
        Ok(delivered)
    }

    async fn close(self: Box<Self>) -> Result<(), GatewayError> {
        self.conn
            .close()
            .await
            .map_err(|e| GatewayError::execution(format!("failed to close connection: {}", e)))
    }
}

fn render_row(row: &PgRow, width: usize) -> Row {
    (0..width).map(|i| render_cell(row, i)).collect()
}

/// Render one cell as text, trying the warehouse's common types in turn.
fn render_cell(row: &PgRow, index: usize) -> Option<String> {
    let raw = match row.try_get_raw(index) {
        Ok(raw) if !raw.is_null() => raw,
        _ => return None,
    };

    if let Ok(v) = row.try_get::<i64, _>(index) {
        Some(v.to_string())
    } else if let Ok(v) = row.try_get::<i32, _>(index) {
        Some(v.to_string())
    } else if let Ok(v) = row.try_get::<i16, _>(index) {
        Some(v.to_string())
    } else if let Ok(v) = row.try_get::<f64, _>(index) {
        Some(v.to_string())
    } else if let Ok(v) = row.try_get::<f32, _>(index) {
        Some(v.to_string())
    } else if let Ok(v) = row.try_get::<bool, _>(index) {
        Some(v.to_string())
    } else if let Ok(v) = row.try_get::<String, _>(index) {
        Some(v)
    } else if let Ok(v) = row.try_get::<BigDecimal, _>(index) {
        Some(v.to_string())
    } else if let Ok(v) = row.try_get::<NaiveDate, _>(index) {
        Some(v.to_string())
    } else if let Ok(v) = row.try_get::<NaiveDateTime, _>(index) {
        Some(v.to_string())
    } else if let Ok(v) = row.try_get::<DateTime<Utc>, _>(index) {
        Some(v.to_rfc3339())
    } else if let Ok(v) = row.try_get::<NaiveTime, _>(index) {
        Some(v.to_string())
    } else if let Ok(v) = row.try_get::<uuid::Uuid, _>(index) {
        Some(v.to_string())
    } else if let Ok(v) = row.try_get::<serde_json::Value, _>(index) {
        Some(v.to_string())
    } else {
        let type_name = raw.type_info().name().to_string();
        let text = match raw.format() {
            PgValueFormat::Text => raw.as_str().ok(),
            PgValueFormat::Binary => None,
        };
        tracing::debug!(column = index, type_name = %type_name, "Unsupported column type rendered as text fallback");
        Some(unsupported_cell(&type_name, text))
    }
}

/// Text for a non-null value of a type with no decoder: the server's text
/// form when it sent one, otherwise the type name in angle brackets.
fn unsupported_cell(type_name: &str, text: Option<&str>) -> String {
    match text {
        Some(text) => text.to_string(),
        None => format!("<{}>", type_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WarehouseConfig {
        WarehouseConfig {
            host: Some("cdw.example.org".to_string()),
            database: Some("caboodle".to_string()),
            username: Some("reader".to_string()),
            password: Some("secret".to_string()),
            statement_timeout_seconds: Some(300),
            ..WarehouseConfig::default()
        }
    }

    #[test]
    fn test_from_config() {
        let connector = PgConnector::from_config(&config()).unwrap();
        assert_eq!(connector.target(), "cdw.example.org:5432/caboodle");
        assert_eq!(connector.options.get_host(), "cdw.example.org");
        assert_eq!(connector.options.get_database(), Some("caboodle"));
        assert!(!format!("{:?}", connector).contains("secret"));
    }

    #[test]
    fn test_unsupported_type_is_never_blank() {
        assert_eq!(unsupported_cell("INTERVAL", Some("1 day")), "1 day");
        assert_eq!(unsupported_cell("INTERVAL", Some("")), "");
        assert_eq!(unsupported_cell("MONEY", None), "<MONEY>");
        assert_eq!(unsupported_cell("INT4RANGE", None), "<INT4RANGE>");
    }

    #[test]
    fn test_from_config_requires_fields() {
        let err = PgConnector::from_config(&WarehouseConfig::default()).unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("warehouse.host"));
    }
}
