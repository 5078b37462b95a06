//! Errors raised while building a query.

use cdw_policy::ValidationError;
use cdw_schema::SchemaError;
use thiserror::Error;

/// Errors produced by the query constructor.
#[derive(Debug, Error)]
pub enum QueryError {
    /// An interpolated value or an embedded clause failed policy.
    #[error(transparent)]
    Rejected(#[from] ValidationError),

    /// An argument is malformed (bad date, empty keyword, unknown domain).
    #[error("{0}")]
    InvalidArgument(String),

    /// The schema index could not answer the lookup.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl QueryError {
    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
