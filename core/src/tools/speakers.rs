use crate::engine::SpeechEngine;
use crate::mcp::ErrorCode;
use crate::tools::{Tool, ToolError, ToolOutput, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub struct GetSpeakersTool {
    engine: Arc<dyn SpeechEngine>,
}

impl GetSpeakersTool {
    pub fn new(engine: Arc<dyn SpeechEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Tool for GetSpeakersTool {
    fn name(&self) -> String {
        "get_speakers".to_string()
    }

    fn description(&self) -> String {
        "List the speakers available on the VOICEVOX engine".to_string()
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn call(&self, _arguments: Value) -> ToolResult<ToolOutput> {
        let speakers = self
            .engine
            .speakers()
            .await
            .map_err(|e| ToolError::Engine {
                code: ErrorCode::EngineUnreachable,
                context: "Failed to get speakers".to_string(),
                source: e,
            })?;
        debug!(target: "speech", count = speakers.len(), "Fetched speakers");

        let listing = serde_json::to_string_pretty(&speakers)
            .map_err(|e| ToolError::Internal(e.to_string()))?;

        Ok(ToolOutput {
            text: format!("Available speakers:\n{}", listing),
            data: json!({ "speakers": speakers }),
        })
    }
}
