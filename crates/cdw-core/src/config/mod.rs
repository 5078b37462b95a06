//! Configuration types for the CDW MCP server.
//!
//! Configuration is loaded from a YAML file (`cdw.yaml`) and overlaid with
//! environment variables:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `CLINICAL_RECORDS_SERVER` | `warehouse.host` |
//! | `CLINICAL_RECORDS_DATABASE` | `warehouse.database` |
//! | `CLINICAL_RECORDS_USERNAME` | `warehouse.username` |
//! | `CLINICAL_RECORDS_PASSWORD` | `warehouse.password` |
//! | `CDW_SCHEMA` | `warehouse.schema` |
//! | `CDW_NAMESPACE` | `namespace` |
//! | `CDW_LOG_LEVEL` | `log_level` |
//! | `CDW_SCHEMA_REFERENCE` | `schema_reference` |

pub mod mcp;
pub mod warehouse;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use mcp::{McpConfig, Transport, namespace_prefix};
pub use warehouse::{SslMode, WarehouseConfig};

/// Complete server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdwConfig {
    /// Warehouse connection.
    #[serde(default)]
    pub warehouse: WarehouseConfig,

    /// MCP server settings.
    #[serde(default)]
    pub mcp: McpConfig,

    /// Tool name namespace (rendered as `<namespace>-<tool>`).
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Path to the bundled schema reference document.
    #[serde(default = "default_schema_reference")]
    pub schema_reference: PathBuf,

    /// Log verbosity (an `EnvFilter` directive such as `info` or `cdw_mcp=debug`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Row bounds for query tools.
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Default for CdwConfig {
    fn default() -> Self {
        Self {
            warehouse: WarehouseConfig::default(),
            mcp: McpConfig::default(),
            namespace: default_namespace(),
            schema_reference: default_schema_reference(),
            log_level: default_log_level(),
            limits: LimitsConfig::default(),
        }
    }
}

/// Row bounds applied to query tools.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Row limit used when a caller does not supply one.
    #[serde(default = "default_row_limit")]
    pub default_row_limit: u64,

    /// Ceiling for caller-supplied row limits.
    #[serde(default = "default_max_row_limit")]
    pub max_row_limit: u64,

    /// Rows fetched per round trip when exporting to a file.
    #[serde(default = "default_export_batch_size")]
    pub export_batch_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            default_row_limit: default_row_limit(),
            max_row_limit: default_max_row_limit(),
            export_batch_size: default_export_batch_size(),
        }
    }
}

impl LimitsConfig {
    /// Resolve a caller-supplied row limit against the defaults and ceiling.
    pub fn resolve(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.default_row_limit)
            .clamp(1, self.max_row_limit.max(1))
    }
}

fn default_namespace() -> String {
    "CDW".to_string()
}

fn default_schema_reference() -> PathBuf {
    PathBuf::from("data/schema_reference.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_row_limit() -> u64 {
    1000
}

fn default_max_row_limit() -> u64 {
    10000
}

fn default_export_batch_size() -> usize {
    5000
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

impl CdwConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let mut config = Self::from_yaml(&content)?;
        config.resolve_relative_paths(path.as_ref());
        Ok(config)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary variable lookup.
    ///
    /// Empty values are ignored so an unset-but-declared variable in a
    /// launcher manifest does not clobber the file configuration.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("CLINICAL_RECORDS_SERVER") {
            self.warehouse.host = Some(v);
        }
        if let Some(v) = get("CLINICAL_RECORDS_DATABASE") {
            self.warehouse.database = Some(v);
        }
        if let Some(v) = get("CLINICAL_RECORDS_USERNAME") {
            self.warehouse.username = Some(v);
        }
        if let Some(v) = get("CLINICAL_RECORDS_PASSWORD") {
            self.warehouse.password = Some(v);
        }
        if let Some(v) = get("CDW_SCHEMA") {
            self.warehouse.schema = v;
        }
        if let Some(v) = get("CDW_NAMESPACE") {
            self.namespace = v;
        }
        if let Some(v) = get("CDW_LOG_LEVEL") {
            self.log_level = v.to_lowercase();
        }
        if let Some(v) = get("CDW_SCHEMA_REFERENCE") {
            self.schema_reference = PathBuf::from(v);
        }
    }

    /// Check that everything needed to serve warehouse queries is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing = self.warehouse.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing(missing))
        }
    }

    /// Tool-name prefix derived from the namespace.
    pub fn tool_prefix(&self) -> String {
        namespace_prefix(&self.namespace)
    }

    fn resolve_relative_paths(&mut self, config_path: &Path) {
        if self.schema_reference.is_relative()
            && let Some(dir) = config_path.parent()
            && !dir.as_os_str().is_empty()
        {
            self.schema_reference = dir.join(&self.schema_reference);
        }
    }
}
