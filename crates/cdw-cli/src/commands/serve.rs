//! `cdw serve`: run the MCP server against the configured warehouse.

use anyhow::{Context, Result};
use cdw_adapter_pg::PgConnector;
use cdw_core::{CdwConfig, Transport};
use cdw_mcp::McpServer;
use clap::Args;
use std::sync::Arc;
use tracing::{info, warn};

/// Arguments for `cdw serve`.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Transport type (stdio or http). Overrides config file.
    #[arg(long)]
    pub transport: Option<Transport>,

    /// HTTP port (only for http transport). Overrides config file.
    #[arg(long)]
    pub port: Option<u16>,

    /// HTTP bind host (only for http transport). Overrides config file.
    #[arg(long)]
    pub host: Option<String>,
}

/// Command-line flags win over the file and the environment.
fn apply_overrides(config: &mut CdwConfig, args: &ServeArgs) {
    if let Some(transport) = args.transport {
        config.mcp.transport = transport;
    }
    if let Some(port) = args.port {
        config.mcp.port = port;
    }
    if let Some(host) = &args.host {
        config.mcp.host = host.clone();
    }
}

pub async fn execute(mut config: CdwConfig, args: ServeArgs) -> Result<()> {
    apply_overrides(&mut config, &args);
    config
        .validate()
        .context("Warehouse connection is not configured")?;

    if !config.schema_reference.exists() {
        warn!(
            path = %config.schema_reference.display(),
            "Schema reference not found; discovery tools will fail until it exists"
        );
    }

    let connector = PgConnector::from_config(&config.warehouse)
        .context("Failed to configure warehouse connection")?;
    let server = McpServer::from_config(&config, Arc::new(connector));

    info!(
        transport = ?config.mcp.transport,
        target = %config.warehouse.display_target(),
        namespace = %config.namespace,
        tools = server.tools().len(),
        "Starting CDW MCP server"
    );

    server.run().await.context("MCP server stopped with an error")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let mut config = CdwConfig::default();
        let args = ServeArgs {
            transport: Some(Transport::Http),
            port: Some(9000),
            host: None,
        };
        apply_overrides(&mut config, &args);

        assert!(config.mcp.is_http());
        assert_eq!(config.mcp.bind_address(), "127.0.0.1:9000");
    }

    #[tokio::test]
    async fn test_unconfigured_warehouse_refuses_to_start() {
        let args = ServeArgs {
            transport: None,
            port: None,
            host: None,
        };
        let err = execute(CdwConfig::default(), args).await.unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }
}
