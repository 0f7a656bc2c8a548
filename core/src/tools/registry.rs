use super::error::{ToolError, ToolResult};
use super::speakers::GetSpeakersTool;
use super::speech::TextToSpeechTool;
use super::traits::{Tool, ToolOutput};
use crate::audio::AudioPlayer;
use crate::config::Config;
use crate::engine::SpeechEngine;
use crate::mcp::McpTool;
use crate::storage::{AudioStore, FileNaming};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Ordered set of tools; `tools/list` reports them in registration order
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `text_to_speech` and `get_speakers`, wired to `engine`
    pub fn voicevox(config: &Config, engine: Arc<dyn SpeechEngine>, naming: FileNaming) -> Self {
        let store = AudioStore::new(config.temp_dir.clone()).with_naming(naming);
        let player =
            AudioPlayer::new(config.enable_playback).with_preferred(config.player.clone());
        info!(
            target: "tool_registry",
            dir = %store.dir().display(),
            naming = ?store.naming(),
            playback = player.is_enabled(),
            "Wiring VOICEVOX tools"
        );

        let mut registry = Self::new();
        registry.register(Arc::new(TextToSpeechTool::new(
            config,
            Arc::clone(&engine),
            store,
            player,
        )));
        registry.register(Arc::new(GetSpeakersTool::new(engine)));
        registry
    }

    /// Register a tool, replacing any tool with the same name in place
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name();
        info!(target: "tool_registry", tool = %name, "Registering tool");

        match self.tools.iter().position(|t| t.name() == name) {
            Some(idx) => self.tools[idx] = tool,
            None => self.tools.push(tool),
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn descriptors(&self) -> Vec<McpTool> {
        self.tools.iter().map(|t| t.descriptor()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Call a tool by name
    #[tracing::instrument(skip(self, arguments), fields(tool.name = %name))]
    pub async fn call(&self, name: &str, arguments: serde_json::Value) -> ToolResult<ToolOutput> {
        let start_time = std::time::Instant::now();

        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        debug!(target: "tool_registry", tool = %name, "Invoking tool");
        let result = tool.call(arguments).await;

        let elapsed_ms = start_time.elapsed().as_secs_f64() * 1000.0;
        match &result {
            Ok(_) => debug!(target: "tool_registry", tool = %name, elapsed_ms, "Tool finished"),
            Err(e) => {
                warn!(target: "tool_registry", tool = %name, error = %e, elapsed_ms, "Tool execution failed")
            }
        }

        result
    }
}
