//! `cdw tools`: print the tool catalog offline.

use anyhow::Result;
use cdw_core::CdwConfig;
use cdw_mcp::{ToolDefinition, build_registry};

pub fn list(config: &CdwConfig, verbose: bool) -> Result<()> {
    let registry = build_registry(&config.tool_prefix());
    println!("Available Tools ({}):", registry.len());
    for tool in registry.list() {
        println!("{}", summary_line(tool));
        if verbose {
            println!("{}", serde_json::to_string_pretty(&tool.input_schema)?);
        }
    }
    Ok(())
}

fn summary_line(tool: &ToolDefinition) -> String {
    let idempotent = tool
        .annotations
        .as_ref()
        .and_then(|a| a.idempotent_hint)
        .unwrap_or(false);
    let badge = if idempotent { "read" } else { "read, not idempotent" };
    format!(
        "  {} [{}]\n      {}",
        tool.name,
        badge,
        tool.description.as_deref().unwrap_or_default()
    )
}
