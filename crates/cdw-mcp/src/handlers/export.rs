//! Export of a full result set to a CSV file.

use super::{ToolContext, ToolResult, json_text, required_str};
use crate::protocol::ToolContent;
use cdw_adapter_pg::{ExportOutcome, NO_EXPORT_MESSAGE};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

pub async fn export_query_to_csv(ctx: Arc<ToolContext>, args: Value) -> ToolResult {
    let sql = required_str(&args, "sql_query")?;
    let filepath = required_str(&args, "filepath")?;
    let outcome = ctx.gateway.export(sql, Path::new(filepath.trim())).await?;
    match outcome {
        ExportOutcome::Written(summary) => json_text(&summary.to_json()),
        ExportOutcome::NoResults => Ok(vec![ToolContent::text(NO_EXPORT_MESSAGE)]),
    }
}
