//! Tool registry
//!
//! Maps tool names to their implementations and descriptors. The registry is
//! populated once at startup and only read while the server is running.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::github::GitHubError;
use crate::mcp::protocol::ToolDefinition;
use crate::spreadsheet::SpreadsheetError;

/// Errors raised while populating the registry
#[derive(Error, Debug, PartialEq)]
pub enum RegistryError {
    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("Tool name cannot be empty")]
    EmptyName,
}

/// Errors a tool implementation can report
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Failed(String),

    #[error("GitHub error: {0}")]
    GitHub(#[from] GitHubError),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] SpreadsheetError),}

/// Named arguments of a tool call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments(Map<String, Value>);

impl ToolArguments {
    pub fn new(arguments: Map<String, Value>) -> Self {
        Self(arguments)
    }

    /// Bind the arguments to a typed parameter struct
    pub fn parse<T: DeserializeOwned>(self) -> Result<T, ToolError> {
        serde_json::from_value(Value::Object(self.0))
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// Value returned by a successful tool call
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Text(String),
    Json(Value),
}

impl ToolOutput {
    /// Render the output as the text of a content block
    ///
    /// JSON values are pretty-printed; key order follows `serde_json::Map`,
    /// so the rendering is deterministic.
    pub fn into_text(self) -> String {
        match self {
            ToolOutput::Text(text) => text,
            ToolOutput::Json(Value::String(text)) => text,
            ToolOutput::Json(value) => {
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

impl From<String> for ToolOutput {
    fn from(text: String) -> Self {
        ToolOutput::Text(text)
    }
}

impl From<&str> for ToolOutput {
    fn from(text: &str) -> Self {
        ToolOutput::Text(text.to_string())
    }
}

/// A callable tool implementation
///
/// Implementations receive only their named arguments. They must not write to
/// stdout; diagnostics go through `tracing`.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError>;
}

/// Adapter turning a synchronous closure into a [`ToolHandler`]
pub struct FnTool<F>(F);

impl<F> FnTool<F>
where
    F: Fn(ToolArguments) -> Result<ToolOutput, ToolError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> ToolHandler for FnTool<F>
where
    F: Fn(ToolArguments) -> Result<ToolOutput, ToolError> + Send + Sync,
{
    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        (self.0)(arguments)
    }
}

struct RegisteredTool {
    definition: ToolDefinition,
    handler: Arc<dyn ToolHandler>,
}

/// Registry of available MCP tools, kept in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under the name carried by its definition
    ///
    /// A name that is already taken is rejected and the registry is left
    /// unchanged.
    pub fn register<H>(&mut self, definition: ToolDefinition, handler: H) -> Result<(), RegistryError>
    where
        H: ToolHandler + 'static,
    {
        self.register_arc(definition, Arc::new(handler))
    }

    pub fn register_arc(
        &mut self,
        definition: ToolDefinition,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), RegistryError> {
        if definition.name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.index.contains_key(&definition.name) {
            return Err(RegistryError::DuplicateTool(definition.name));
        }

        tracing::debug!(tool = %definition.name, "Registered tool");
        self.index.insert(definition.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool { definition, handler });
        Ok(())
    }

    /// Find the implementation registered under `name`
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.index
            .get(name)
            .map(|&position| Arc::clone(&self.tools[position].handler))
    }

    /// All tool definitions, in registration order
    pub fn list(&self) -> Vec<&ToolDefinition> {
        self.tools.iter().map(|tool| &tool.definition).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
