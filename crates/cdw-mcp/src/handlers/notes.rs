//! Clinical note search and retrieval.

use super::{ToolContext, ToolResult, optional_u64, required_key, required_str};
use crate::error::ToolError;
use crate::protocol::ToolContent;
use serde_json::Value;
use std::sync::Arc;

pub async fn search_notes(ctx: Arc<ToolContext>, args: Value) -> ToolResult {
    let key = required_key(&args, "patient_durable_key")?;
    let keyword = required_str(&args, "keyword")?;
    let spec = ctx
        .constructor
        .search_notes(&key, keyword, optional_u64(&args, "row_limit")?)?;
    ctx.run_rendered(&spec).await
}

pub async fn get_note(ctx: Arc<ToolContext>, args: Value) -> ToolResult {
    let note_key = required_key(&args, "note_key")?;
    let spec = ctx.constructor.get_note(&note_key)?;
    let result = ctx.run(&spec).await?;
    if result.row_count() == 0 {
        return Err(ToolError::not_found(format!(
            "Note '{}' not found. Use search_notes to find note keys.",
            note_key.trim()
        )));
    }
    Ok(vec![ToolContent::text(result.render()?)])
}
