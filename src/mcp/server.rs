//! MCP server implementation that handles JSON-RPC communication
//!
//! This module implements the actual MCP server that:
//! 1. Reads JSON-RPC requests line by line
//! 2. Routes them to `initialize`, `tools/list` or `tools/call`
//! 3. Writes exactly one JSON-RPC response line per request

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::mcp::protocol::*;
use crate::mcp::registry::{ToolArguments, ToolRegistry};
use crate::ServerError;

/// MCP server that handles communication with one client
pub struct McpServer {
    /// Tools exposed through `tools/list` and `tools/call`
    registry: ToolRegistry,
    /// Reported by `initialize`
    server_info: ServerInfo,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(registry: ToolRegistry, server_info: ServerInfo) -> Self {
        Self {
            registry,
            server_info,
        }
    }

    /// Run the MCP server over the process's stdin/stdout
    pub async fn run_stdio(&self) -> Result<(), ServerError> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve requests from `reader` until it reaches end-of-input
    ///
    /// Requests are handled strictly one at a time: a response line is fully
    /// written and flushed before the next input line is read.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<(), ServerError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Starting MCP server, waiting for JSON-RPC requests...");

        let mut buffer = Vec::new();

        loop {
            buffer.clear();

            match reader.read_until(b'\n', &mut buffer).await {
                Ok(0) => {
                    info!("MCP server shutting down (input closed)");
                    break;
                }
                Ok(_) => {
                    let response = match std::str::from_utf8(&buffer) {
                        Ok(line) => self.handle_line(line).await,
                        Err(e) => {
                            warn!("Received a line that is not valid UTF-8: {}", e);
                            Some(DecodeError::Parse(e.to_string()).into_response())
                        }
                    };

                    if let Some(response) = response {
                        let encoded = encode_response(&response);

                        writer.write_all(encoded.as_bytes()).await?;
                        writer.write_all(b"\n").await?;
                        writer.flush().await?;

                        debug!("Sent response: {}", encoded);
                    }
                }
                Err(e) => {
                    error!("Failed to read request: {}", e);
                    return Err(ServerError::Io(e));
                }
            }
        }

        Ok(())
    }

    /// Process a single line of JSON-RPC input
    ///
    /// Blank lines produce no response; every other line produces exactly one.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        debug!("Processing request: {}", line);

        match decode_request(line) {
            Ok(request) => Some(self.handle_request(request).await),
            Err(e) => {
                warn!("Rejected malformed request: {:?}", e);
                Some(e.into_response())
            }
        }
    }

    /// Handle a decoded JSON-RPC request
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "tools/list" => self.handle_tools_list(request),
            "tools/call" => self.handle_tools_call(request).await,
            _ => {
                warn!(method = %request.method, "Unknown method");
                JsonRpcResponse::error(
                    request.id,
                    error_codes::METHOD_NOT_FOUND,
                    format!("Unknown method: {}", request.method),
                )
            }
        }
    }

    /// Handle MCP initialization request
    ///
    /// The client's protocol version is accepted as-is.
    fn handle_initialize(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        if let Some(client) = request.params_or_empty().get("clientInfo") {
            info!("MCP client connected: {}", client);
        } else {
            info!("MCP client connected");
        }

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Map::new(),
                resources: Map::new(),
            },
            server_info: self.server_info.clone(),
        };

        self.respond(request.id, result)
    }

    /// Handle tools/list request
    fn handle_tools_list(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let tools = self.registry.list();
        debug!("Listing {} tools", tools.len());
        JsonRpcResponse::success(request.id, json!({ "tools": tools }))
    }

    /// Handle tools/call request
    async fn handle_tools_call(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let tool_params: ToolCallParams = match serde_json::from_value(request.params_or_empty()) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(
                    request.id,
                    error_codes::INVALID_PARAMS,
                    format!("Invalid params: {}", e),
                );
            }
        };

        let Some(handler) = self.registry.lookup(&tool_params.name) else {
            warn!(tool = %tool_params.name, "Tool not found");
            return JsonRpcResponse::error(
                request.id,
                error_codes::TOOL_NOT_FOUND,
                format!("Tool not found: {}", tool_params.name),
            );
        };

        debug!(tool = %tool_params.name, "Calling tool");
        let arguments = ToolArguments::new(tool_params.arguments);
        let outcome = AssertUnwindSafe(handler.call(arguments)).catch_unwind().await;

        match outcome {
            Ok(Ok(output)) => self.respond(request.id, ToolCallResult::text(output.into_text())),
            Ok(Err(e)) => {
                warn!(tool = %tool_params.name, "Tool execution failed: {}", e);
                JsonRpcResponse::error(
                    request.id,
                    error_codes::TOOL_EXECUTION_FAILED,
                    format!("Tool execution failed: {}", e),
                )
            }
            Err(panic) => {
                let detail = panic_message(panic.as_ref());
                error!(tool = %tool_params.name, "Tool panicked: {}", detail);
                JsonRpcResponse::error(
                    request.id,
                    error_codes::INTERNAL_ERROR,
                    format!("Internal error: tool '{}' panicked: {}", tool_params.name, detail),
                )
            }
        }
    }

    /// Serialize a result payload into a success response
    fn respond<T: serde::Serialize>(&self, id: Value, result: T) -> JsonRpcResponse {
        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(
                id,
                error_codes::INTERNAL_ERROR,
                format!("Internal error: {}", e),
            ),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
