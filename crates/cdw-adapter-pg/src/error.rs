//! Gateway error types.

use cdw_policy::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from statement execution and export.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The statement failed the read-only policy and was never sent.
    #[error(transparent)]
    Rejected(#[from] ValidationError),

    /// The warehouse was unreachable or refused the credentials.
    #[error("Could not connect to the warehouse at {target}: {message}")]
    ConnectionFailure { target: String, message: String },

    /// The warehouse accepted the connection but failed the statement.
    #[error("Query failed: {0}")]
    ExecutionFailure(String),

    /// Export destination directory does not exist.
    #[error("Export directory does not exist: {}", .0.display())]
    ExportPathInvalid(PathBuf),

    /// Writing the export file failed.
    #[error("Failed to write {}: {message}", path.display())]
    ExportWrite { path: PathBuf, message: String },
}

impl GatewayError {
    pub fn connection(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectionFailure {
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::ExecutionFailure(message.into())
    }

    /// True when the caller may retry the same call unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::ConnectionFailure { .. })
    }
}

/// Remove a secret from a driver message.
pub fn redact(message: &str, secret: Option<&str>) -> String {
    match secret {
        Some(secret) if !secret.is_empty() => message.replace(secret, "********"),
        _ => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact() {
        assert_eq!(
            redact("password authentication failed: hunter2", Some("hunter2")),
            "password authentication failed: ********"
        );
        assert_eq!(redact("boom", None), "boom");
        assert_eq!(redact("boom", Some("")), "boom");
    }

    #[test]
    fn test_retryable() {
        assert!(GatewayError::connection("db:5432/cdw", "refused").is_retryable());
        assert!(!GatewayError::execution("bad column").is_retryable());
    }
}
