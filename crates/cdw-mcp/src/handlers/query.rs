//! Free-form SQL and the per-patient canned queries.

use super::{ToolContext, ToolResult, optional_str, optional_u64, required_key, required_str};
use cdw_query::{DateRange, PatientEntity};
use serde_json::Value;
use std::sync::Arc;

pub async fn query(ctx: Arc<ToolContext>, args: Value) -> ToolResult {
    let sql = required_str(&args, "sql_query")?;
    let spec = ctx.constructor.free_form(sql, optional_u64(&args, "row_limit")?);
    ctx.run_rendered(&spec).await
}

/// Handler body shared by the five per-patient tools.
pub async fn patient_facts(entity: PatientEntity, ctx: Arc<ToolContext>, args: Value) -> ToolResult {
    let key = required_key(&args, "patient_durable_key")?;
    let row_limit = optional_u64(&args, "row_limit")?;
    let range = DateRange::parse(optional_str(&args, "since")?, optional_str(&args, "until")?)?;

    // The index only refines how the fact table reaches the stable key, so a
    // missing reference document is not fatal here.
    let index = match ctx.schema.index() {
        Ok(index) => Some(index),
        Err(e) => {
            tracing::warn!(error = %e, "Schema index unavailable; assuming direct patient key");
            None
        }
    };

    let spec = ctx
        .constructor
        .patient_query(entity, &key, range, row_limit, index)?;
    ctx.run_rendered(&spec).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolErrorKind;
    use crate::handlers::test_support::{cell, context, text};
    use cdw_adapter_pg::{MemoryConnector, NO_RESULTS_MESSAGE};
    use cdw_policy::ValidationErrorKind;
    use serde_json::json;

    #[tokio::test]
    async fn test_query_returns_csv() {
        let connector = MemoryConnector::new().with_rows(
            "FROM PatientDim",
            ["PatientDurableKey", "Sex"],
            vec![vec![cell("1"), cell("F")], vec![cell("2"), None]],
        );
        let result = query(
            context(&connector),
            json!({"sql_query": "SELECT PatientDurableKey, Sex FROM PatientDim"}),
        )
        .await
        .unwrap();
        assert_eq!(text(&result), "PatientDurableKey,Sex\n1,F\n2,");
    }

    #[tokio::test]
    async fn test_query_row_limit_bounds_result() {
        let rows = (0..20).map(|i| vec![cell(&i.to_string())]).collect();
        let connector = MemoryConnector::new().with_rows("FROM t", ["n"], rows);
        let result = query(
            context(&connector),
            json!({"sql_query": "SELECT n FROM t", "row_limit": 5}),
        )
        .await
        .unwrap();
        assert_eq!(text(&result).lines().count(), 6);
    }

    #[tokio::test]
    async fn test_query_without_result_columns() {
        let result = query(
            context(&MemoryConnector::new()),
            json!({"sql_query": "SELECT FROM PatientDim WHERE false"}),
        )
        .await
        .unwrap();
        assert_eq!(text(&result), NO_RESULTS_MESSAGE);
    }

    #[tokio::test]
    async fn test_mutation_is_rejected_before_connecting() {
        let connector = MemoryConnector::new();
        let err = query(
            context(&connector),
            json!({"sql_query": "SELECT 1; DROP TABLE PatientDim"}),
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.kind,
            ToolErrorKind::ValidationRejected(ValidationErrorKind::ForbiddenKeyword)
        );
        assert_eq!(connector.opened(), 0);
    }

    #[tokio::test]
    async fn test_patient_query_uses_stable_key() {
        let connector = MemoryConnector::new().with_rows(
            "EncounterFact",
            ["EncounterKey", "DateKey"],
            vec![vec![cell("9"), cell("20240105")]],
        );
        let args = json!({
            "patient_durable_key": 12345,
            "since": "2024-01-01",
            "until": "2024-12-31",
            "row_limit": 10
        });
        let result = patient_facts(PatientEntity::Encounters, context(&connector), args)
            .await
            .unwrap();
        assert_eq!(text(&result), "EncounterKey,DateKey\n9,20240105");

        let sql = &connector.executed()[0];
        assert!(sql.contains("f.\"PatientDurableKey\" = '12345'"), "{sql}");
        assert!(!sql.contains("JOIN"), "{sql}");
        assert!(sql.contains(">= 20240101"), "{sql}");
        assert!(sql.contains("<= 20241231"), "{sql}");
        assert!(sql.contains("ORDER BY f.\"DateKey\" DESC"), "{sql}");
        assert!(sql.ends_with("LIMIT 10"), "{sql}");
    }

    #[tokio::test]
    async fn test_patient_key_is_checked() {
        let connector = MemoryConnector::new();
        let err = patient_facts(
            PatientEntity::Labs,
            context(&connector),
            json!({"patient_durable_key": "1' OR '1'='1"}),
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.kind,
            ToolErrorKind::ValidationRejected(ValidationErrorKind::UnsafeValue)
        );
        assert_eq!(connector.opened(), 0);
    }

    #[tokio::test]
    async fn test_bad_date_is_invalid_argument() {
        let err = patient_facts(
            PatientEntity::Diagnoses,
            context(&MemoryConnector::new()),
            json!({"patient_durable_key": "7", "since": "last spring"}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::InvalidArgument);
    }
}
