/// MCP protocol implementation
///
/// This module handles the Model Context Protocol communication over stdio:
/// envelope decoding and encoding, the tool registry and request dispatch.

pub mod protocol;
pub mod registry;
pub mod server;

// Re-export main types
pub use protocol::{
    error_codes, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ServerInfo, ToolCallResult,
    ToolContent, ToolDefinition, MCP_VERSION,
};
pub use registry::{FnTool, RegistryError, ToolArguments, ToolError, ToolHandler, ToolOutput, ToolRegistry};
pub use server::McpServer;
