//! CLI command implementations for the CDW MCP server.

pub mod check;
pub mod schema;
pub mod serve;
pub mod tools;

use anyhow::{Context, Result};
use cdw_core::CdwConfig;
use std::path::Path;

/// Load the config file if present, then overlay the environment.
pub fn load_config(path: &Path) -> Result<CdwConfig> {
    let mut config = if path.exists() {
        CdwConfig::from_file(path)
            .with_context(|| format!("Failed to load config file: {:?}", path))?
    } else {
        CdwConfig::default()
    };
    config.apply_env();
    Ok(config)
}
