//! Schema discovery. Answered from the schema index; never connects.

use super::{ToolContext, ToolResult, json_text, required_str};
use crate::protocol::ToolContent;
use cdw_schema::SearchOutcome;
use serde_json::Value;
use std::sync::Arc;

pub async fn get_database_overview(ctx: Arc<ToolContext>, _args: Value) -> ToolResult {
    let index = ctx.schema.index()?;
    json_text(&index.overview())
}

pub async fn describe_table(ctx: Arc<ToolContext>, args: Value) -> ToolResult {
    let table_name = required_str(&args, "table_name")?;
    let table = ctx.schema.index()?.describe(table_name.trim())?;
    json_text(table)
}

pub async fn search_schema(ctx: Arc<ToolContext>, args: Value) -> ToolResult {
    let keyword = required_str(&args, "keyword")?;
    match ctx.schema.index()?.search(keyword)? {
        SearchOutcome::Matches(hits) => {
            tracing::debug!(keyword = %keyword, tables = hits.len(), "Schema search matched");
            json_text(&hits)
        }
        outcome @ SearchOutcome::NoMatches { .. } => Ok(vec![ToolContent::text(
            outcome.no_matches_message().unwrap_or_default(),
        )]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolErrorKind;
    use crate::handlers::test_support::{context, text};
    use cdw_adapter_pg::MemoryConnector;
    use serde_json::json;

    #[tokio::test]
    async fn test_overview_lists_every_table_without_columns() {
        let connector = MemoryConnector::new();
        let result = get_database_overview(context(&connector), json!({})).await.unwrap();
        let overview: Value = serde_json::from_str(text(&result)).unwrap();

        let names: Vec<_> = overview
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["table_name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["EncounterFact", "PatientDim"]);
        assert_eq!(overview[0]["column_count"], json!(4));
        assert!(overview[0].get("columns").is_none());
        assert_eq!(connector.opened(), 0);
    }

    #[tokio::test]
    async fn test_describe_is_case_insensitive() {
        let connector = MemoryConnector::new();
        let result = describe_table(context(&connector), json!({"table_name": "encounterfact"}))
            .await
            .unwrap();
        let table: Value = serde_json::from_str(text(&result)).unwrap();
        assert_eq!(table["table_name"], json!("EncounterFact"));
        assert_eq!(table["columns"].as_array().unwrap().len(), 4);
        assert_eq!(table["columns"][3]["queryable"], json!(false));
    }

    #[tokio::test]
    async fn test_describe_unknown_table() {
        let err = describe_table(context(&MemoryConnector::new()), json!({"table_name": "Nope"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::NotFound);
        assert!(err.message.contains("get_database_overview"));
    }

    #[tokio::test]
    async fn test_search_lists_only_matching_columns() {
        let result = search_schema(context(&MemoryConnector::new()), json!({"keyword": "datekey"}))
            .await
            .unwrap();
        let hits: Value = serde_json::from_str(text(&result)).unwrap();
        assert_eq!(hits.as_array().unwrap().len(), 1);
        let columns: Vec<_> = hits[0]["matching_columns"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["column_name"].as_str().unwrap())
            .collect();
        assert_eq!(columns, vec!["DateKey", "DateKeyValue"]);
    }

    #[tokio::test]
    async fn test_search_without_matches() {
        let result = search_schema(context(&MemoryConnector::new()), json!({"keyword": "allergy"}))
            .await
            .unwrap();
        assert_eq!(text(&result), "No tables or columns matching 'allergy' found.");

        let err = search_schema(context(&MemoryConnector::new()), json!({"keyword": "  "}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::InvalidArgument);
    }
}
