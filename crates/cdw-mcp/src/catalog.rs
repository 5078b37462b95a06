//! The tool catalog.
//!
//! Every tool the server exposes is declared here: its name (prefixed with
//! the configured namespace), description, input schema, annotations and
//! handler. All tools are read-only.

use crate::handlers::{ToolContext, concepts, export, notes, query, schema, stats};
use crate::protocol::{ToolAnnotations, ToolDefinition};
use crate::tools::{FnHandler, ToolHandler, ToolRegistry};
use cdw_query::PatientEntity;
use serde_json::{Value, json};
use std::future::Future;
use std::sync::Arc;

/// Unprefixed names of every tool, in catalog order.
pub const TOOL_NAMES: [&str; 16] = [
    "get_database_overview",
    "describe_table",
    "search_schema",
    "query",
    "get_patient_demographics",
    "get_encounters",
    "get_medications",
    "get_diagnoses",
    "get_labs",
    "search_notes",
    "get_note",
    "export_query_to_csv",
    "map_to_standard",
    "find_related_concepts",
    "summarize_table",
    "cohort_summary",
];

struct ToolSpec {
    name: &'static str,
    title: &'static str,
    description: &'static str,
    idempotent: bool,
    input_schema: Value,
    handler: Arc<dyn ToolHandler>,
}

/// Build the registry with every tool name prefixed by `prefix`.
pub fn build_registry(prefix: &str) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for spec in tool_specs() {
        let definition = ToolDefinition {
            name: format!("{}{}", prefix, spec.name),
            description: Some(spec.description.to_string()),
            input_schema: spec.input_schema,
            annotations: Some(ToolAnnotations::read_only(spec.title, spec.idempotent)),
        };
        if let Err(e) = registry.register(definition, spec.handler) {
            tracing::error!(error = %e, "Skipping tool");
        }
    }
    tracing::debug!(prefix = %prefix, tool_count = registry.len(), "Built tool registry");
    registry
}

fn handler<F, Fut>(f: F) -> Arc<dyn ToolHandler>
where
    F: Fn(Arc<ToolContext>, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = crate::handlers::ToolResult> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

fn patient_handler(entity: PatientEntity) -> Arc<dyn ToolHandler> {
    handler(move |ctx, args| query::patient_facts(entity, ctx, args))
}

fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn row_limit(default: u64) -> Value {
    json!({
        "type": "integer",
        "minimum": 1,
        "description": format!("Maximum rows to return (default {})", default),
    })
}

fn patient_key() -> Value {
    json!({
        "type": ["string", "integer"],
        "description": "The patient's PatientDurableKey (stable across all PatientDim versions)",
    })
}

fn date_bound(description: &str) -> Value {
    json!({
        "type": "string",
        "pattern": "^\\d{4}-\\d{2}-\\d{2}$",
        "description": description,
    })
}

fn patient_schema(with_range: bool) -> Value {
    let mut properties = json!({
        "patient_durable_key": patient_key(),
        "row_limit": row_limit(1000),
    });
    if with_range {
        properties["since"] = date_bound("Earliest date to include, YYYY-MM-DD");
        properties["until"] = date_bound("Latest date to include, YYYY-MM-DD");
    }
    object_schema(properties, &["patient_durable_key"])
}

fn tool_specs() -> Vec<ToolSpec> {
    vec![
        // Schema discovery
        ToolSpec {
            name: "get_database_overview",
            title: "Get Database Overview",
            description: "Get an overview of all tables in the Clinical Data Warehouse with their \
                          descriptions and whether they contain patient or encounter data. Call \
                          this first to understand what data is available.",
            idempotent: true,
            input_schema: object_schema(json!({}), &[]),
            handler: handler(schema::get_database_overview),
        },
        ToolSpec {
            name: "describe_table",
            title: "Describe Table",
            description: "Get column names, data types, descriptions and lookup relationships for \
                          one table. Columns marked queryable=false do not exist in the SQL view; \
                          use the base column named in their note instead.",
            idempotent: true,
            input_schema: object_schema(
                json!({"table_name": {"type": "string", "description": "Table name"}}),
                &["table_name"],
            ),
            handler: handler(schema::describe_table),
        },
        ToolSpec {
            name: "search_schema",
            title: "Search Schema",
            description: "Search table and column names and descriptions for a keyword such as \
                          'allergy', 'medication' or 'lab'.",
            idempotent: true,
            input_schema: object_schema(
                json!({"keyword": {"type": "string", "description": "Case-insensitive keyword"}}),
                &["keyword"],
            ),
            handler: handler(schema::search_schema),
        },
        // SQL
        ToolSpec {
            name: "query",
            title: "Query Clinical Data",
            description: "Execute a READ-ONLY SQL query on the Clinical Data Warehouse. Only \
                          SELECT, WITH and DECLARE statements are allowed. Results are returned \
                          as CSV.",
            idempotent: true,
            input_schema: object_schema(
                json!({
                    "sql_query": {"type": "string", "description": "Read-only SQL SELECT query"},
                    "row_limit": row_limit(1000),
                }),
                &["sql_query"],
            ),
            handler: handler(query::query),
        },
        // Per-patient facts
        ToolSpec {
            name: "get_patient_demographics",
            title: "Get Patient Demographics",
            description: "Retrieve every PatientDim version for a patient, current version first.",
            idempotent: true,
            input_schema: patient_schema(false),
            handler: patient_handler(PatientEntity::Demographics),
        },
        ToolSpec {
            name: "get_encounters",
            title: "Get Patient Encounters",
            description: "Retrieve a patient's encounters from EncounterFact, most recent first.",
            idempotent: true,
            input_schema: patient_schema(true),
            handler: patient_handler(PatientEntity::Encounters),
        },
        ToolSpec {
            name: "get_medications",
            title: "Get Patient Medications",
            description: "Retrieve a patient's medication orders from MedicationOrderFact, most \
                          recent first.",
            idempotent: true,
            input_schema: patient_schema(true),
            handler: patient_handler(PatientEntity::Medications),
        },
        ToolSpec {
            name: "get_diagnoses",
            title: "Get Patient Diagnoses",
            description: "Retrieve a patient's diagnoses from DiagnosisEventFact, most recent first.",
            idempotent: true,
            input_schema: patient_schema(true),
            handler: patient_handler(PatientEntity::Diagnoses),
        },
        ToolSpec {
            name: "get_labs",
            title: "Get Patient Labs",
            description: "Retrieve a patient's lab component results from LabComponentResultFact, \
                          most recent first.",
            idempotent: true,
            input_schema: patient_schema(true),
            handler: patient_handler(PatientEntity::Labs),
        },
        // Notes
        ToolSpec {
            name: "search_notes",
            title: "Search Clinical Notes",
            description: "Search a patient's clinical notes for a keyword. Returns note metadata \
                          and a text snippet; use get_note for the full text.",
            idempotent: true,
            input_schema: object_schema(
                json!({
                    "patient_durable_key": patient_key(),
                    "keyword": {"type": "string", "description": "Text to search for"},
                    "row_limit": row_limit(50),
                }),
                &["patient_durable_key", "keyword"],
            ),
            handler: handler(notes::search_notes),
        },
        ToolSpec {
            name: "get_note",
            title: "Get Clinical Note",
            description: "Retrieve the full text of one clinical note by its deid_note_key.",
            idempotent: true,
            input_schema: object_schema(
                json!({"note_key": {"type": ["string", "integer"], "description": "The deid_note_key"}}),
                &["note_key"],
            ),
            handler: handler(notes::get_note),
        },
        // Export
        ToolSpec {
            name: "export_query_to_csv",
            title: "Export Query to CSV",
            description: "Execute a read-only SQL query and write every result row to a CSV file. \
                          The directory must already exist. Returns the file path and row count.",
            idempotent: false,
            input_schema: object_schema(
                json!({
                    "sql_query": {"type": "string", "description": "Read-only SQL SELECT query"},
                    "filepath": {"type": "string", "description": "Destination CSV path"},
                }),
                &["sql_query", "filepath"],
            ),
            handler: handler(export::export_query_to_csv),
        },
        // Concepts
        ToolSpec {
            name: "map_to_standard",
            title: "Map Code to Concept",
            description: "Look up a diagnosis, procedure or medication code across the terminology \
                          tables. A source vocabulary (ICD-10-CM, SNOMED, CPT, NDC, RXNORM, ...) \
                          narrows the search.",
            idempotent: true,
            input_schema: object_schema(
                json!({
                    "code": {"type": "string", "description": "The code to look up"},
                    "source_vocabulary": {"type": "string", "description": "Vocabulary of the code"},
                    "row_limit": row_limit(50),
                }),
                &["code"],
            ),
            handler: handler(concepts::map_to_standard),
        },
        ToolSpec {
            name: "find_related_concepts",
            title: "Find Related Concepts",
            description: "Search terminology codes and names containing a term, optionally limited \
                          to one domain.",
            idempotent: true,
            input_schema: object_schema(
                json!({
                    "concept": {"type": "string", "description": "Code or name fragment"},
                    "relationship_type": {
                        "type": "string",
                        "enum": ["diagnosis", "medication", "procedure"],
                        "description": "Restrict to one domain",
                    },
                    "row_limit": row_limit(50),
                }),
                &["concept"],
            ),
            handler: handler(concepts::find_related_concepts),
        },
        // Statistics
        ToolSpec {
            name: "summarize_table",
            title: "Summarize Table",
            description: "Get the row count and per-column null counts and percentages for a table.",
            idempotent: true,
            input_schema: object_schema(
                json!({"table_name": {"type": "string", "description": "Table name to summarize"}}),
                &["table_name"],
            ),
            handler: handler(stats::summarize_table),
        },
        ToolSpec {
            name: "cohort_summary",
            title: "Cohort Summary",
            description: "Count distinct patients in PatientDim (alias p) matching a SQL WHERE \
                          clause, e.g. p.\"Sex\" = 'Female'.",
            idempotent: false,
            input_schema: object_schema(
                json!({"sql_filter": {"type": "string", "description": "SQL WHERE clause"}}),
                &["sql_filter"],
            ),
            handler: handler(stats::cohort_summary),
        },
    ]
}
