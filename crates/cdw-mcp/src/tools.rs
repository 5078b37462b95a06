//! Tool registry for MCP tools.
//!
//! Each tool is data: a [`ToolDefinition`] advertised to clients and a
//! [`ToolHandler`] that runs it. The registry is filled once at startup by
//! [`crate::catalog::build_registry`] and is read-only afterwards.

use crate::error::{McpError, ToolError};
use crate::handlers::ToolContext;
use crate::protocol::{ToolContent, ToolDefinition};
use async_trait::async_trait;
use jsonschema::Validator;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

/// Runs one tool call.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(
        &self,
        context: Arc<ToolContext>,
        arguments: Value,
    ) -> Result<Vec<ToolContent>, ToolError>;
}

/// Adapts an async function into a [`ToolHandler`].
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(Arc<ToolContext>, Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<ToolContent>, ToolError>> + Send + 'static,
{
    async fn call(
        &self,
        context: Arc<ToolContext>,
        arguments: Value,
    ) -> Result<Vec<ToolContent>, ToolError> {
        (self.0)(context, arguments).await
    }
}

/// A definition paired with its handler and compiled input schema.
#[derive(Clone)]
pub struct RegisteredTool {
    pub definition: ToolDefinition,
    pub handler: Arc<dyn ToolHandler>,
    validator: Arc<Validator>,
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("name", &self.definition.name)
            .finish_non_exhaustive()
    }
}

impl RegisteredTool {
    /// Validate call arguments against the compiled input schema.
    ///
    /// Optional arguments may be passed explicitly as null; such keys are
    /// dropped before validation, so a null required argument is reported
    /// as missing.
    pub fn validate_arguments(&self, arguments: &Value) -> Result<(), ToolError> {
        let instance = match arguments {
            Value::Object(map) => Value::Object(
                map.iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            other => other.clone(),
        };

        let messages: Vec<String> = self
            .validator
            .iter_errors(&instance)
            .map(|error| {
                let path = error.instance_path().to_string();
                if path.is_empty() {
                    error.to_string()
                } else {
                    format!("{}: {}", path, error)
                }
            })
            .collect();

        if messages.is_empty() {
            Ok(())
        } else {
            Err(ToolError::invalid_argument(messages.join("; ")))
        }
    }
}

/// Registry of available MCP tools, ordered by name.
#[derive(Clone, Default, Debug)]
pub struct ToolRegistry {
    tools: BTreeMap<String, RegisteredTool>,
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name.
    ///
    /// Fails if the input schema does not compile.
    pub fn register(
        &mut self,
        definition: ToolDefinition,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), McpError> {
        let validator = jsonschema::validator_for(&definition.input_schema).map_err(|e| {
            McpError::InvalidToolSchema {
                tool: definition.name.clone(),
                message: e.to_string(),
            }
        })?;
        self.tools.insert(
            definition.name.clone(),
            RegisteredTool {
                definition,
                handler,
                validator: Arc::new(validator),
            },
        );
        Ok(())
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    /// Check if a tool exists.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Definitions of all tools.
    pub fn list(&self) -> Vec<&ToolDefinition> {
        self.tools.values().map(|t| &t.definition).collect()
    }

    /// Get the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Get tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }
}
