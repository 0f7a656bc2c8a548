//! MCP request dispatcher
//!
//! Maps one JSON-RPC request to one JSON-RPC response. Method names are
//! matched exactly: `initialize`, `tools/list`, `tools/call`. The response
//! always carries the request `id` unchanged.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use super::types::{
    CallToolParams, CallToolResult, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, McpTool, ServerCapabilities, ServerInfo, ToolContent,
    ToolsCapability, PROTOCOL_VERSION, SERVER_NAME,
};
use crate::config::Config;
use crate::engine::SpeechEngine;
use crate::storage::FileNaming;
use crate::tools::{ToolOutput, ToolRegistry, ToolResult};

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_TOOLS_LIST: &str = "tools/list";
pub const METHOD_TOOLS_CALL: &str = "tools/call";

#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    server_info: ServerInfo,
}

impl Dispatcher {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    /// Dispatcher serving the VOICEVOX tools with `speech_{speaker}_{secs}.wav` output
    pub fn from_config(config: &Config, engine: Arc<dyn SpeechEngine>) -> Self {
        Self::with_naming(config, engine, FileNaming::PerSpeaker)
    }

    pub fn with_naming(config: &Config, engine: Arc<dyn SpeechEngine>, naming: FileNaming) -> Self {
        Self::new(ToolRegistry::voicevox(config, engine, naming))
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    pub fn tools(&self) -> Vec<McpTool> {
        self.registry.descriptors()
    }

    /// Run a tool directly, bypassing the JSON-RPC envelope
    pub async fn call_tool(&self, name: &str, arguments: Value) -> ToolResult<ToolOutput> {
        self.registry.call(name, arguments).await
    }

    /// Handle an already-decoded JSON message.
    ///
    /// Anything that is not a request object becomes `InvalidRequest`,
    /// keeping whatever `id` can be recovered.
    pub async fn handle_value(&self, message: Value) -> JsonRpcResponse {
        let id = match &message {
            Value::Object(obj) => obj.get("id").cloned().unwrap_or(Value::Null),
            _ => {
                return JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::invalid_request("Invalid request: expected a JSON object"),
                )
            }
        };

        match serde_json::from_value::<JsonRpcRequest>(message) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                warn!(target: "dispatcher", error = %e, "Rejecting malformed request");
                JsonRpcResponse::failure(
                    id,
                    JsonRpcError::invalid_request(format!("Invalid request: {}", e)),
                )
            }
        }
    }

    pub async fn handle(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!(target: "dispatcher", method = %request.method, id = %request.id, "Handling request");

        let JsonRpcRequest {
            id, method, params, ..
        } = request;

        let outcome = match method.as_str() {
            METHOD_INITIALIZE => Ok(self.initialize()),
            METHOD_TOOLS_LIST => Ok(self.list_tools()),
            METHOD_TOOLS_CALL => self.tools_call(params).await,
            other => Err(JsonRpcError::method_not_found(other)),
        };

        match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => {
                debug!(target: "dispatcher", code = error.code, message = %error.message, "Request failed");
                JsonRpcResponse::failure(id, error)
            }
        }
    }

    fn initialize(&self) -> Value {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
            },
            server_info: self.server_info.clone(),
        };
        json!(result)
    }

    fn list_tools(&self) -> Value {
        json!(ListToolsResult {
            tools: self.tools(),
        })
    }

    async fn tools_call(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)))?;

        let arguments = params.arguments.unwrap_or_else(|| json!({}));
        let output = self.call_tool(&params.name, arguments).await?;

        Ok(json!(CallToolResult {
            content: vec![ToolContent::text(output.text)],
        }))
    }
}
