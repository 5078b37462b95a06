//! HTTP transport for MCP server.
//!
//! JSON-RPC over `POST /mcp`, plus a `GET /health` check. Each request is
//! handled independently against the shared server.

use crate::error::McpError;
use crate::protocol::{JsonRpcRequest, JsonRpcResponse, codes};
use crate::server::McpServer;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Create the HTTP router for MCP.
pub fn create_router(server: Arc<McpServer>) -> Router {
    Router::new()
        .route("/mcp", post(handle_mcp_post))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(server)
}

/// Handle POST requests to /mcp (JSON-RPC over HTTP).
async fn handle_mcp_post(State(server): State<Arc<McpServer>>, body: String) -> Response {
    let request: JsonRpcRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(e) => {
            let error = JsonRpcResponse::error(
                None,
                codes::PARSE_ERROR,
                format!("Parse error: {}", e),
            );
            return (StatusCode::BAD_REQUEST, Json(error)).into_response();
        }
    };

    match server.handle_request(request).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Handle health check requests.
async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "cdw-mcp",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// HTTP server for MCP transport.
pub struct HttpServer {
    address: String,
    server: Arc<McpServer>,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(address: impl Into<String>, server: Arc<McpServer>) -> Self {
        Self {
            address: address.into(),
            server,
        }
    }

    /// Run the HTTP server until Ctrl-C.
    pub async fn run(self) -> Result<(), McpError> {
        let app = create_router(self.server);

        let listener = tokio::net::TcpListener::bind(&self.address)
            .await
            .map_err(|e| {
                McpError::StartupFailed(format!("Failed to bind to {}: {}", self.address, e))
            })?;

        tracing::info!(address = %self.address, "MCP HTTP server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| McpError::TransportError(e.to_string()))?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_registry;
    use crate::handlers::ToolContext;
    use crate::handlers::test_support::index;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use cdw_adapter_pg::{ExecutionGateway, MemoryConnector};
    use cdw_core::{LimitsConfig, McpConfig};
    use cdw_query::QueryConstructor;
    use cdw_schema::SchemaCatalog;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> Router {
        let context = ToolContext::new(
            Arc::new(SchemaCatalog::from_index(index())),
            ExecutionGateway::new(Arc::new(MemoryConnector::new())),
            QueryConstructor::new(LimitsConfig::default()),
        );
        create_router(Arc::new(McpServer::new(
            McpConfig::default(),
            build_registry("CDW-"),
            context,
        )))
    }

    fn post_mcp(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_tool_call_over_http() {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "tools/call",
            "params": {"name": "CDW-search_schema", "arguments": {"keyword": "patient"}}
        });
        let response = app().oneshot(post_mcp(body.to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["id"], json!(7));
        assert_eq!(value["result"]["isError"], json!(false));
    }

    #[tokio::test]
    async fn test_notification_is_accepted_without_body() {
        let body = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        let response = app().oneshot(post_mcp(body.to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let response = app().oneshot(post_mcp("{".to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
