/// Model Context Protocol (MCP) server side
///
/// Protocol reference: https://modelcontextprotocol.io
///
/// Architecture:
/// - `types`: MCP protocol types (JSON-RPC 2.0 based)
/// - `error`: stable error code table shared by every transport
/// - `dispatcher`: routes `initialize`, `tools/list` and `tools/call`
pub mod dispatcher;
pub mod error;
pub mod types;

pub use dispatcher::Dispatcher;
pub use error::ErrorCode;
pub use types::{
    CallToolParams, CallToolResult, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, McpTool, ServerInfo, ToolContent, PROTOCOL_VERSION,
    SERVER_NAME,
};
