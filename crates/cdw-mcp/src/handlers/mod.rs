//! Tool handlers, grouped by concern.
//!
//! Handlers are plain async functions taking the shared [`ToolContext`] and
//! the call arguments. Arguments have already been checked against the
//! tool's input schema; the helpers here only extract them.

pub mod concepts;
pub mod export;
pub mod notes;
pub mod query;
pub mod schema;
pub mod stats;

use crate::error::ToolError;
use crate::protocol::ToolContent;
use cdw_adapter_pg::{ExecutionGateway, ResultSet};
use cdw_query::{QueryConstructor, QuerySpec};
use cdw_schema::SchemaCatalog;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Everything a handler needs. Shared by every call; holds no connection.
pub struct ToolContext {
    pub schema: Arc<SchemaCatalog>,
    pub gateway: ExecutionGateway,
    pub constructor: QueryConstructor,
}

impl ToolContext {
    pub fn new(
        schema: Arc<SchemaCatalog>,
        gateway: ExecutionGateway,
        constructor: QueryConstructor,
    ) -> Self {
        Self {
            schema,
            gateway,
            constructor,
        }
    }

    /// Execute a built statement and return the result set.
    pub(crate) async fn run(&self, spec: &QuerySpec) -> Result<ResultSet, ToolError> {
        Ok(self.gateway.execute(spec).await?)
    }

    /// Execute and render as delimited text.
    pub(crate) async fn run_rendered(&self, spec: &QuerySpec) -> Result<Vec<ToolContent>, ToolError> {
        let result = self.run(spec).await?;
        Ok(vec![ToolContent::text(result.render()?)])
    }
}

pub(crate) type ToolResult = Result<Vec<ToolContent>, ToolError>;

/// Pretty JSON as a single text block.
pub(crate) fn json_text<T: Serialize>(value: &T) -> ToolResult {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| ToolError::internal(format!("failed to serialize result: {}", e)))?;
    Ok(vec![ToolContent::text(text)])
}

pub(crate) fn required_str<'a>(args: &'a Value, field: &str) -> Result<&'a str, ToolError> {
    optional_str(args, field)?
        .ok_or_else(|| ToolError::invalid_argument(format!("Missing required field: {}", field)))
}

pub(crate) fn optional_str<'a>(args: &'a Value, field: &str) -> Result<Option<&'a str>, ToolError> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(ToolError::invalid_argument(format!(
            "'{}' must be a string, got {}",
            field, other
        ))),
    }
}

/// A key argument that clients may send as a string or an integer.
pub(crate) fn required_key(args: &Value, field: &str) -> Result<String, ToolError> {
    match args.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        None | Some(Value::Null) => Err(ToolError::invalid_argument(format!(
            "Missing required field: {}",
            field
        ))),
        Some(other) => Err(ToolError::invalid_argument(format!(
            "'{}' must be a string or integer, got {}",
            field, other
        ))),
    }
}

pub(crate) fn optional_u64(args: &Value, field: &str) -> Result<Option<u64>, ToolError> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_u64().map(Some).ok_or_else(|| {
            ToolError::invalid_argument(format!("'{}' must be a positive integer, got {}", field, v))
        }),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use cdw_adapter_pg::MemoryConnector;
    use cdw_core::LimitsConfig;
    use cdw_schema::{ColumnDescriptor, SchemaIndex, TableDescriptor};

    /// A small index with the tables the handlers touch.
    pub fn index() -> SchemaIndex {
        let mut patient = TableDescriptor::new("PatientDim");
        patient.description = "Patient demographics, one row per version".to_string();
        patient.has_patient_data = true;
        patient.has_phi = true;
        patient.patient_key_column = Some("PatientDurableKey".to_string());
        patient.columns = vec![
            ColumnDescriptor::new("PatientKey", "bigint"),
            ColumnDescriptor::new("PatientDurableKey", "bigint"),
            ColumnDescriptor::new("BirthDate", "date"),
        ];

        let mut encounter = TableDescriptor::new("EncounterFact");
        encounter.description = "One row per encounter".to_string();
        encounter.has_patient_data = true;
        encounter.has_encounter_data = true;
        let mut derived = ColumnDescriptor::new("DateKeyValue", "date");
        derived.queryable = false;
        derived.note = Some("Use DateKey".to_string());
        encounter.columns = vec![
            ColumnDescriptor::new("EncounterKey", "bigint"),
            ColumnDescriptor::new("PatientDurableKey", "bigint"),
            ColumnDescriptor::new("DateKey", "int"),
            derived,
        ];

        SchemaIndex::from_tables([patient, encounter])
    }

    pub fn context(connector: &MemoryConnector) -> Arc<ToolContext> {
        Arc::new(ToolContext::new(
            Arc::new(SchemaCatalog::from_index(index())),
            ExecutionGateway::new(Arc::new(connector.clone())),
            QueryConstructor::new(LimitsConfig::default()),
        ))
    }

    pub fn cell(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    pub fn text(result: &[ToolContent]) -> &str {
        result[0].as_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_accepts_string_or_integer() {
        let args = json!({"a": "X-1", "b": 42, "c": 1.5, "d": null});
        assert_eq!(required_key(&args, "a").unwrap(), "X-1");
        assert_eq!(required_key(&args, "b").unwrap(), "42");
        assert!(required_key(&args, "c").is_err());
        assert!(required_key(&args, "d").is_err());
        assert!(required_key(&args, "e").is_err());
    }

    #[test]
    fn test_optional_arguments() {
        let args = json!({"limit": 5, "since": null, "bad": -1});
        assert_eq!(optional_u64(&args, "limit").unwrap(), Some(5));
        assert_eq!(optional_u64(&args, "missing").unwrap(), None);
        assert!(optional_u64(&args, "bad").is_err());
        assert_eq!(optional_str(&args, "since").unwrap(), None);
        assert!(required_str(&args, "since").is_err());
    }
}
