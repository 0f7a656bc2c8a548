// Vox Core Library
// VOICEVOX speech synthesis exposed as MCP tools

pub mod audio;
pub mod config;
pub mod engine;
pub mod mcp;
pub mod storage;
pub mod tools;

// Export core types
pub use audio::{AudioPlayer, Playback, PlaybackError};
pub use config::{Config, ConfigOverrides, Prosody};
pub use engine::{AudioQuery, EngineError, Speaker, SpeechEngine, VoicevoxClient};
pub use mcp::{Dispatcher, ErrorCode, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use storage::{AudioStore, FileNaming};
pub use tools::{Tool, ToolError, ToolOutput, ToolRegistry};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoxError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl VoxError {
    /// Domain code from the shared error table
    pub fn code(&self) -> ErrorCode {
        match self {
            VoxError::ConfigError(_) => ErrorCode::Configuration,
            VoxError::IoError(_) => ErrorCode::FileWriteFailed,
            VoxError::SerializationError(_) => ErrorCode::InternalError,
        }
    }
}

pub type Result<T> = std::result::Result<T, VoxError>;
