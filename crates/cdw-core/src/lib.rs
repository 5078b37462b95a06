//! Shared configuration for the clinical data warehouse MCP server.
//!
//! The configuration is loaded from a YAML file (`cdw.yaml` by default) and
//! then overlaid with the environment variables the desktop extension
//! manifests pass in (`CLINICAL_RECORDS_*`, `CDW_*`).

pub mod config;

pub use config::{
    CdwConfig, ConfigError, LimitsConfig, McpConfig, SslMode, Transport, WarehouseConfig,
    namespace_prefix,
};
