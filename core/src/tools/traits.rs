use super::error::ToolResult;
use crate::mcp::McpTool;
use async_trait::async_trait;
use serde_json::Value;

/// What a tool hands back to the transports
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Human-readable summary, sent as MCP text content
    pub text: String,
    /// Structured payload, sent by the websocket surface
    pub data: Value,
}

/// The core trait for the tools served over MCP
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of the tool (e.g., "text_to_speech")
    fn name(&self) -> String;

    /// A human-readable description of what the tool does
    fn description(&self) -> String;

    /// The JSON Schema for the tool's arguments (discovery only)
    fn parameters(&self) -> Value;

    /// Execute the tool with the given arguments
    async fn call(&self, arguments: Value) -> ToolResult<ToolOutput>;

    fn descriptor(&self) -> McpTool {
        McpTool {
            name: self.name(),
            description: self.description(),
            input_schema: self.parameters(),
        }
    }
}
