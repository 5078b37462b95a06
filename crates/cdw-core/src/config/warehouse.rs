//! Warehouse connection configuration.
//!
//! Credentials may be given inline, through `password_env`, or through the
//! `CLINICAL_RECORDS_*` environment overrides applied by
//! [`CdwConfig::apply_env`](super::CdwConfig::apply_env).

use serde::{Deserialize, Serialize};

/// Connection settings for the read-only clinical data warehouse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Hostname of the warehouse server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Port of the warehouse server.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database name to connect to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Username for the (read-only) warehouse account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password for the warehouse account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable containing the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    /// Schema that unqualified table names resolve against (e.g. `deid_uf`).
    #[serde(default = "default_schema")]
    pub schema: String,

    /// SSL mode for the connection.
    #[serde(default)]
    pub ssl_mode: SslMode,

    /// Application name reported to the server.
    #[serde(default = "default_application_name")]
    pub application_name: String,

    /// Server-side statement timeout. Unset means the server default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_timeout_seconds: Option<u32>,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: default_port(),
            database: None,
            username: None,
            password: None,
            password_env: None,
            schema: default_schema(),
            ssl_mode: SslMode::default(),
            application_name: default_application_name(),
            statement_timeout_seconds: None,
        }
    }
}

/// SSL mode for database connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SslMode {
    /// Disable SSL.
    Disable,
    /// Allow SSL but don't require it.
    Allow,
    /// Prefer SSL (default).
    #[default]
    Prefer,
    /// Require SSL.
    Require,
    /// Require SSL with CA verification.
    #[serde(rename = "verify-ca")]
    VerifyCa,
    /// Require SSL with full verification.
    #[serde(rename = "verify-full")]
    VerifyFull,
}

impl WarehouseConfig {
    /// Get the password, checking `password_env` first.
    pub fn resolved_password(&self) -> Option<String> {
        if let Some(env_var) = &self.password_env
            && let Ok(password) = std::env::var(env_var)
        {
            return Some(password);
        }
        self.password.clone()
    }

    /// Connection target without credentials, for logs and error messages.
    pub fn display_target(&self) -> String {
        format!(
            "{}:{}/{}",
            self.host.as_deref().unwrap_or("<unset>"),
            self.port,
            self.database.as_deref().unwrap_or("<unset>")
        )
    }

    /// Names of the required connection fields that are missing or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let blank = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());
        let mut missing = Vec::new();
        if blank(&self.host) {
            missing.push("warehouse.host");
        }
        if blank(&self.database) {
            missing.push("warehouse.database");
        }
        if blank(&self.username) {
            missing.push("warehouse.username");
        }
        if blank(&self.resolved_password()) {
            missing.push("warehouse.password");
        }
        missing
    }
}

fn default_port() -> u16 {
    5432
}

fn default_schema() -> String {
    "deid_uf".to_string()
}

fn default_application_name() -> String {
    "cdw-mcp".to_string()
}
