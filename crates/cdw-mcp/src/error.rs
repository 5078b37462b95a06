//! Error types for the MCP crate.

use cdw_adapter_pg::GatewayError;
use cdw_policy::{ValidationError, ValidationErrorKind};
use cdw_query::QueryError;
use cdw_schema::SchemaError;
use std::fmt;
use thiserror::Error;

/// Errors that stop the MCP server itself.
#[derive(Debug, Error)]
pub enum McpError {
    /// Failed to start the server.
    #[error("failed to start MCP server: {0}")]
    StartupFailed(String),

    /// Transport error.
    #[error("transport error: {0}")]
    TransportError(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A tool's input schema does not compile.
    #[error("invalid input schema for tool '{tool}': {message}")]
    InvalidToolSchema { tool: String, message: String },
}

/// Category of a failed tool call, reported to the caller in the result text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    /// The statement or an interpolated value failed the read-only policy.
    ValidationRejected(ValidationErrorKind),
    /// A table or note does not exist.
    NotFound,
    /// The warehouse could not be reached. The caller may retry.
    ConnectionFailure,
    /// The warehouse rejected or failed the statement.
    ExecutionFailure,
    /// The export directory does not exist.
    ExportPathInvalid,
    /// Arguments do not match the tool's input schema.
    InvalidArgument,
    Internal,
}

impl ToolErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolErrorKind::ValidationRejected(_) => "ValidationRejected",
            ToolErrorKind::NotFound => "NotFound",
            ToolErrorKind::ConnectionFailure => "ConnectionFailure",
            ToolErrorKind::ExecutionFailure => "ExecutionFailure",
            ToolErrorKind::ExportPathInvalid => "ExportPathInvalid",
            ToolErrorKind::InvalidArgument => "InvalidArgument",
            ToolErrorKind::Internal => "Internal",
        }
    }
}

impl fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolErrorKind::ValidationRejected(reason) => write!(f, "{} ({})", self.as_str(), reason),
            other => f.write_str(other.as_str()),
        }
    }
}

/// A tool call failure. Rendered as `<kind>: <message>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidArgument, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Internal, message)
    }

    /// True when the same call may succeed if retried.
    pub fn is_retryable(&self) -> bool {
        self.kind == ToolErrorKind::ConnectionFailure
    }
}

impl From<ValidationError> for ToolError {
    fn from(err: ValidationError) -> Self {
        Self::new(ToolErrorKind::ValidationRejected(err.kind), err.message)
    }
}

impl From<GatewayError> for ToolError {
    fn from(err: GatewayError) -> Self {
        let kind = match &err {
            GatewayError::Rejected(e) => return e.clone().into(),
            GatewayError::ConnectionFailure { .. } => ToolErrorKind::ConnectionFailure,
            GatewayError::ExecutionFailure(_) | GatewayError::ExportWrite { .. } => {
                ToolErrorKind::ExecutionFailure
            }
            GatewayError::ExportPathInvalid(_) => ToolErrorKind::ExportPathInvalid,
        };
        Self::new(kind, err.to_string())
    }
}

impl From<SchemaError> for ToolError {
    fn from(err: SchemaError) -> Self {
        let kind = match &err {
            SchemaError::TableNotFound { .. } => ToolErrorKind::NotFound,
            SchemaError::EmptyKeyword => ToolErrorKind::InvalidArgument,
            SchemaError::Io { .. } | SchemaError::Parse(_) | SchemaError::Dictionary { .. } => {
                ToolErrorKind::Internal
            }
        };
        Self::new(kind, err.to_string())
    }
}

impl From<QueryError> for ToolError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Rejected(e) => e.into(),
            QueryError::InvalidArgument(message) => Self::invalid_argument(message),
            QueryError::Schema(e) => e.into(),
        }
    }
}
