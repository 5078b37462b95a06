//! # cdw-mcp
//!
//! MCP (Model Context Protocol) server for a read-only clinical data
//! warehouse.
//!
//! The server exposes a fixed catalog of sixteen tools. Every statement they
//! run, canned or caller-written, passes the read-only policy before it
//! reaches the warehouse.
//!
//! ## Architecture
//!
//! ```text
//! AI Agent
//!       │
//!       │ MCP protocol (tools/list, tools/call, prompts/get)
//!       ▼
//! ┌──────────────────────┐
//! │  CDW MCP Server      │
//! │  1. Check arguments  │  ← tool input schema
//! │  2. Build statement  │  ← cdw-query
//! │  3. Validate         │  ← cdw-policy
//! │  4. Execute          │  ← cdw-adapter-pg
//! │  5. Render text      │
//! └──────────┬───────────┘
//!            │
//!            ▼
//!    Warehouse (Postgres)
//! ```
//!
//! ## Tools
//!
//! | Group | Tools |
//! |-------|-------|
//! | Schema discovery | `get_database_overview`, `describe_table`, `search_schema` |
//! | Query | `query`, `export_query_to_csv` |
//! | Patient facts | `get_patient_demographics`, `get_diagnoses`, `get_medications`, `get_labs`, `get_encounters` |
//! | Notes | `search_notes`, `get_note` |
//! | Concepts | `map_to_standard`, `find_related_concepts` |
//! | Statistics | `summarize_table`, `cohort_summary` |
//!
//! Each name is rendered with the configured namespace prefix (`CDW-query`).
//!
//! ## Example Usage
//!
//! ```ignore
//! use cdw_adapter_pg::PgConnector;
//! use cdw_core::CdwConfig;
//! use cdw_mcp::McpServer;
//!
//! let mut config = CdwConfig::from_file("cdw.yaml")?;
//! config.apply_env();
//! let connector = Arc::new(PgConnector::from_config(&config.warehouse)?);
//! McpServer::from_config(&config, connector).run().await?;
//! ```

pub mod catalog;
pub mod error;
pub mod handlers;
pub mod http_transport;
pub mod prompts;
pub mod protocol;
pub mod server;
pub mod tools;

pub use catalog::{TOOL_NAMES, build_registry};
pub use error::{McpError, ToolError, ToolErrorKind};
pub use handlers::ToolContext;
pub use protocol::{
    CallToolParams, CallToolResponse, JsonRpcRequest, JsonRpcResponse, ToolAnnotations,
    ToolContent, ToolDefinition,
};
pub use server::McpServer;
pub use tools::{ToolHandler, ToolRegistry};
