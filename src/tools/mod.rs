//! MCP tools exposed by the server
//!
//! Each tool binds its arguments to a typed parameter struct; the same struct
//! produces the advertised input schema.

pub mod compare;
pub mod github;
pub mod mapping;
pub mod table;

use std::fmt;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::github::GitHubApi;
use crate::mcp::{RegistryError, ToolError, ToolRegistry};

/// Register every tool, GitHub tools first, in a fixed order
pub fn register_all(registry: &mut ToolRegistry, github: Arc<dyn GitHubApi>) -> Result<(), RegistryError> {
    github::register(registry, github)?;
    table::register(registry)?;
    mapping::register(registry)?;
    compare::register(registry)?;
    Ok(())
}

/// JSON schema of a parameter struct, as advertised in `tools/list`
pub(crate) fn input_schema<T: JsonSchema>() -> Value {
    let mut schema = serde_json::to_value(schemars::schema_for!(T))
        .unwrap_or_else(|_| json!({"type": "object"}));
    if let Some(object) = schema.as_object_mut() {
        object.remove("$schema");
        object.remove("title");
    }
    schema
}

/// Run blocking file work off the async runtime
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, ToolError>
where
    F: FnOnce() -> Result<T, ToolError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ToolError::Failed(format!("background task failed: {}", e)))?
}

/// A column given either as a 1-based index or a header name
#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ColumnRef {
    Index(u64),
    Name(String),
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Index(index) => write!(f, "{}", index),
            ColumnRef::Name(name) => write!(f, "{}", name),
        }
    }
}
