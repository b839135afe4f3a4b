//! MCP (Model Context Protocol) message structures and JSON-RPC handling
//!
//! This module defines the JSON-RPC envelopes exchanged with the MCP client
//! and the payloads of the three methods the server understands.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// MCP protocol version we report
pub const MCP_VERSION: &str = "2024-11-05";

/// JSON-RPC version tag carried by every envelope
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 request message
///
/// Only `method` is mandatory. `id` defaults to `null` and is echoed back
/// verbatim; `params` defaults to an empty mapping.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (expected "2.0", not enforced)
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// Opaque request identifier
    #[serde(default)]
    pub id: Value,
    /// The method to call (e.g., "tools/call")
    pub method: String,
    /// Parameters for the method call
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Parameters of the call, with a missing or `null` value read as `{}`
    pub fn params_or_empty(&self) -> Value {
        match &self.params {
            Some(Value::Null) | None => Value::Object(Map::new()),
            Some(params) => params.clone(),
        }
    }
}

/// Why a line could not be decoded into a request
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The line is not valid JSON (or not UTF-8)
    Parse(String),
    /// Valid JSON, but not a request object
    InvalidRequest(String),
}

impl DecodeError {
    /// Convert the decode failure into its error envelope (always `id: null`)
    pub fn into_response(self) -> JsonRpcResponse {
        match self {
            DecodeError::Parse(detail) => JsonRpcResponse::error(
                Value::Null,
                error_codes::PARSE_ERROR,
                format!("Parse error: {}", detail),
            ),
            DecodeError::InvalidRequest(detail) => JsonRpcResponse::error(
                Value::Null,
                error_codes::INVALID_REQUEST,
                format!("Invalid request: {}", detail),
            ),
        }
    }
}

/// Decode one input line into a request
pub fn decode_request(line: &str) -> Result<JsonRpcRequest, DecodeError> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| DecodeError::Parse(e.to_string()))?;

    if !value.is_object() {
        return Err(DecodeError::InvalidRequest(
            "expected a JSON object".to_string(),
        ));
    }

    serde_json::from_value(value).map_err(|e| DecodeError::InvalidRequest(e.to_string()))
}

/// Envelope written when a response itself cannot be serialized
const ENCODE_FALLBACK: &str =
    r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Internal error: failed to encode response"}}"#;

/// Encode a response as a single line of JSON (without the trailing newline)
pub fn encode_response(response: &JsonRpcResponse) -> String {
    match serde_json::to_string(response) {
        Ok(encoded) => encoded,
        Err(e) => {
            tracing::error!("Failed to encode response: {}", e);
            ENCODE_FALLBACK.to_string()
        }
    }
}

/// JSON-RPC 2.0 response message
///
/// Exactly one of `result` and `error` is present; the constructors are the
/// only way to build one.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: &'static str,
    /// Request ID that we're responding to
    pub id: Value,
    /// Successful result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error information
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,
    /// Human-readable error message
    pub message: String,
}

impl JsonRpcResponse {
    /// Create a successful response
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// MCP tool call parameters
#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call (e.g., "list_files")
    pub name: String,
    /// Arguments to pass to the tool
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// MCP tool call result
#[derive(Debug, Serialize)]
pub struct ToolCallResult {
    /// Tool execution results
    pub content: Vec<ToolContent>,
}

/// Content returned by a tool
#[derive(Debug, Serialize)]
pub struct ToolContent {
    /// Type of content (always "text")
    #[serde(rename = "type")]
    pub content_type: String,
    /// The actual content/result
    pub text: String,
}

impl ToolCallResult {
    /// Create a tool result holding a single text block
    pub fn text(text: String) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_string(),
                text,
            }],
        }
    }
}

/// MCP tool definition, as advertised by `tools/list`
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Tool name (unique within a registry)
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON schema for the tool's input parameters
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// Definition with an input schema that accepts any object
    pub fn without_schema(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(
            name,
            description,
            json!({"type": "object", "properties": {}, "required": []}),
        )
    }
}

/// MCP server capabilities
#[derive(Debug, Serialize)]
pub struct ServerCapabilities {
    /// Tool support (no sub-capabilities)
    pub tools: Map<String, Value>,
    /// Resource support (no sub-capabilities)
    pub resources: Map<String, Value>,
}

/// MCP initialization response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// MCP protocol version we support
    pub protocol_version: String,
    /// Our server capabilities
    pub capabilities: ServerCapabilities,
    /// Information about our server
    pub server_info: ServerInfo,
}

/// Information about this server
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name
    pub name: String,
    /// Server version
    pub version: String,
}

impl ServerInfo {
    /// Server info carrying this crate's version
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// JSON-RPC error codes
pub mod error_codes {
    /// Parse error - Invalid JSON was received by the server
    pub const PARSE_ERROR: i32 = -32700;
    /// Invalid Request - The JSON sent is not a valid Request object
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method not found - The requested method doesn't exist
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid parameters - Method exists but parameters are wrong
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error - an uncaught failure inside the server
    pub const INTERNAL_ERROR: i32 = -32603;

    // Application-specific error codes (-32000 to -32099)
    /// Tool not found - `tools/call` named a tool absent from the registry
    pub const TOOL_NOT_FOUND: i32 = -32001;
    /// Tool execution failed - the tool implementation reported an error
    pub const TOOL_EXECUTION_FAILED: i32 = -32002;
}
