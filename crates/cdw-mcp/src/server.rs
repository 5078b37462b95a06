//! MCP server implementation.
//!
//! Dispatches JSON-RPC requests to the tool registry and the prompt
//! catalog, over stdio or HTTP.

use crate::catalog::build_registry;
use crate::error::McpError;
use crate::handlers::ToolContext;
use crate::http_transport::HttpServer;
use crate::prompts;
use crate::protocol::*;
use crate::tools::ToolRegistry;
use cdw_adapter_pg::{ExecutionGateway, WarehouseConnector};
use cdw_core::{CdwConfig, McpConfig, Transport};
use cdw_query::QueryConstructor;
use cdw_schema::SchemaCatalog;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// The MCP server.
pub struct McpServer {
    config: McpConfig,
    tools: ToolRegistry,
    context: Arc<ToolContext>,
}

impl McpServer {
    /// Create a new MCP server over a built registry.
    pub fn new(config: McpConfig, tools: ToolRegistry, context: ToolContext) -> Self {
        Self {
            config,
            tools,
            context: Arc::new(context),
        }
    }

    /// Wire the full tool catalog from configuration.
    ///
    /// The schema reference is loaded lazily on the first discovery call.
    pub fn from_config(config: &CdwConfig, connector: Arc<dyn WarehouseConnector>) -> Self {
        let gateway = ExecutionGateway::new(connector)
            .with_export_batch_size(config.limits.export_batch_size);
        let context = ToolContext::new(
            Arc::new(SchemaCatalog::from_path(&config.schema_reference)),
            gateway,
            QueryConstructor::new(config.limits),
        );
        Self::new(config.mcp.clone(), build_registry(&config.tool_prefix()), context)
    }

    /// The registered tools.
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Start the MCP server on the configured transport.
    pub async fn run(self) -> Result<(), McpError> {
        match self.config.transport {
            Transport::Stdio => self.run_stdio().await,
            Transport::Http => {
                let address = self.config.bind_address();
                HttpServer::new(address, Arc::new(self)).run().await
            }
        }
    }

    /// Run the server with stdio transport.
    async fn run_stdio(&self) -> Result<(), McpError> {
        tracing::info!(tools = self.tools.len(), "Starting MCP server with stdio transport");
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve_lines(stdin, stdout).await
    }

    /// Serve newline-delimited JSON-RPC until the reader is exhausted.
    pub async fn serve_lines<R, W>(&self, reader: R, mut writer: W) -> Result<(), McpError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_message(&line).await {
                let mut encoded = serde_json::to_string(&response)?;
                encoded.push('\n');
                writer.write_all(encoded.as_bytes()).await?;
                writer.flush().await?;
            }
        }
        tracing::info!("Input closed, stopping stdio transport");
        Ok(())
    }

    /// Handle one raw message. Malformed JSON gets a parse error.
    pub async fn handle_message(&self, raw: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<JsonRpcRequest>(raw) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable JSON-RPC message");
                Some(JsonRpcResponse::error(
                    None,
                    codes::PARSE_ERROR,
                    format!("Parse error: {}", e),
                ))
            }
        }
    }

    /// Handle a JSON-RPC request. Notifications get no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            tracing::debug!(method = %request.method, "Notification received");
            return None;
        }

        let id = request.id.clone();
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                id,
                codes::INVALID_REQUEST,
                "jsonrpc must be \"2.0\"",
            ));
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.handle_list_tools(id),
            "tools/call" => self.handle_call_tool(id, request.params).await,
            "prompts/list" => JsonRpcResponse::success(id, json!({ "prompts": prompts::list() })),
            "prompts/get" => self.handle_get_prompt(id, request.params),
            "shutdown" => self.handle_shutdown(id),
            _ => JsonRpcResponse::error(
                id,
                codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };
        Some(response)
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": ServerInfo {
                name: "cdw-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            "capabilities": {
                "tools": { "listChanged": false },
                "prompts": { "listChanged": false }
            }
        });
        JsonRpcResponse::success(id, result)
    }

    fn handle_list_tools(&self, id: Option<Value>) -> JsonRpcResponse {
        let tools: Vec<ToolDefinition> = self.tools.list().into_iter().cloned().collect();
        match serde_json::to_value(ListToolsResponse { tools }) {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::error(id, codes::INTERNAL_ERROR, e.to_string()),
        }
    }

    async fn handle_call_tool(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: CallToolParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::error(
                    id,
                    codes::INVALID_PARAMS,
                    format!("Invalid params: {}", e),
                );
            }
            None => return JsonRpcResponse::error(id, codes::INVALID_PARAMS, "Missing params"),
        };

        if !self.tools.contains(&params.name) {
            return JsonRpcResponse::error(
                id,
                codes::INVALID_PARAMS,
                format!("Tool not found: {}", params.name),
            );
        }

        let response = self.call_tool(&params.name, params.arguments).await;
        match serde_json::to_value(response) {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::error(id, codes::INTERNAL_ERROR, e.to_string()),
        }
    }

    /// Run a tool. Failures become an `isError` result, never a protocol error.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> CallToolResponse {
        let Some(tool) = self.tools.get(name) else {
            return CallToolResponse::failure(format!("Tool not found: {}", name));
        };
        let arguments = if arguments.is_null() {
            json!({})
        } else {
            arguments
        };

        if let Err(e) = tool.validate_arguments(&arguments) {
            tracing::info!(tool = %name, error = %e, "Tool arguments rejected");
            return CallToolResponse::failure(e.to_string());
        }

        let started = Instant::now();
        let outcome = tool
            .handler
            .call(Arc::clone(&self.context), arguments)
            .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(content) => {
                tracing::info!(tool = %name, elapsed_ms, "Tool call complete");
                CallToolResponse::success(content)
            }
            Err(e) => {
                tracing::warn!(
                    tool = %name,
                    kind = %e.kind,
                    retryable = e.is_retryable(),
                    elapsed_ms,
                    error = %e.message,
                    "Tool call failed"
                );
                CallToolResponse::failure(e.to_string())
            }
        }
    }

    fn handle_get_prompt(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: GetPromptParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::error(
                    id,
                    codes::INVALID_PARAMS,
                    format!("Invalid params: {}", e),
                );
            }
            None => return JsonRpcResponse::error(id, codes::INVALID_PARAMS, "Missing params"),
        };

        match prompts::get(&params.name).map(serde_json::to_value) {
            Some(Ok(result)) => JsonRpcResponse::success(id, result),
            Some(Err(e)) => JsonRpcResponse::error(id, codes::INTERNAL_ERROR, e.to_string()),
            None => JsonRpcResponse::error(
                id,
                codes::INVALID_PARAMS,
                format!("Prompt not found: {}", params.name),
            ),
        }
    }

    fn handle_shutdown(&self, id: Option<Value>) -> JsonRpcResponse {
        tracing::info!("MCP server shutdown requested");
        JsonRpcResponse::success(id, Value::Null)
    }
}
