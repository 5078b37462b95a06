//! Error types for schema loading and lookup.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the schema index.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// No table with this name, exact or case-insensitive.
    #[error("Table '{table}' not found. Use get_database_overview to see available tables.")]
    TableNotFound { table: String },

    /// Search keyword was empty or whitespace.
    #[error("Search keyword must not be empty")]
    EmptyKeyword,

    /// The reference document could not be read.
    #[error("failed to read schema reference {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The reference document is not valid JSON of the expected shape.
    #[error("invalid schema reference: {0}")]
    Parse(#[from] serde_json::Error),

    /// A dictionary export could not be read.
    #[error("failed to read dictionary export {path}: {source}")]
    Dictionary {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl SchemaError {
    /// True for lookups that named something absent from the index.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SchemaError::TableNotFound { .. })
    }
}
