//! Terminology lookups across the diagnosis, procedure and medication
//! dimensions.

use super::{ToolContext, ToolResult, optional_str, optional_u64, required_str};
use serde_json::Value;
use std::sync::Arc;

pub async fn map_to_standard(ctx: Arc<ToolContext>, args: Value) -> ToolResult {
    let spec = ctx.constructor.map_to_standard(
        required_str(&args, "code")?,
        optional_str(&args, "source_vocabulary")?,
        optional_u64(&args, "row_limit")?,
    )?;
    ctx.run_rendered(&spec).await
}

pub async fn find_related_concepts(ctx: Arc<ToolContext>, args: Value) -> ToolResult {
    let spec = ctx.constructor.find_related_concepts(
        required_str(&args, "concept")?,
        optional_str(&args, "relationship_type")?,
        optional_u64(&args, "row_limit")?,
    )?;
    ctx.run_rendered(&spec).await
}
