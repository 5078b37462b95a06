//! Table summaries and cohort counts.

use super::{ToolContext, ToolResult, json_text, required_str};
use crate::error::ToolError;
use cdw_adapter_pg::ResultSet;
use cdw_query::null_percentage;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

#[derive(Debug, Serialize)]
struct ColumnStats {
    name: String,
    data_type: Option<String>,
    null_count: u64,
    null_percentage: f64,
}

#[derive(Debug, Serialize)]
struct TableStats {
    table_name: String,
    row_count: u64,
    columns: Vec<ColumnStats>,
}

pub async fn summarize_table(ctx: Arc<ToolContext>, args: Value) -> ToolResult {
    let table_name = required_str(&args, "table_name")?;
    let summary = ctx
        .constructor
        .summarize_table(table_name, ctx.schema.index()?)?;
    let result = ctx.run(&summary.query).await?;

    let row_count = count(&result, "row_count")?;
    let columns = summary
        .columns
        .into_iter()
        .enumerate()
        .map(|(i, column)| -> Result<ColumnStats, ToolError> {
            let null_count = count(&result, &format!("null_{}", i + 1))?;
            Ok(ColumnStats {
                name: column.name,
                data_type: column.data_type,
                null_count,
                null_percentage: null_percentage(null_count, row_count),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    json_text(&TableStats {
        table_name: summary.table_name,
        row_count,
        columns,
    })
}

pub async fn cohort_summary(ctx: Arc<ToolContext>, args: Value) -> ToolResult {
    let filter = required_str(&args, "sql_filter")?;
    let spec = ctx.constructor.cohort_summary(filter)?;
    let result = ctx.run(&spec).await?;
    let patient_count = count(&result, "patient_count")?;
    json_text(&json!({
        "cohort_filter": filter.trim(),
        "patient_count": patient_count,
    }))
}

/// An aggregate cell from the single result row.
fn count(result: &ResultSet, column: &str) -> Result<u64, ToolError> {
    let cell = result
        .cell(0, column)
        .ok_or_else(|| ToolError::internal(format!("aggregate '{}' missing from result", column)))?;
    cell.trim()
        .parse()
        .map_err(|_| ToolError::internal(format!("aggregate '{}' is not a count: {}", column, cell)))
}
