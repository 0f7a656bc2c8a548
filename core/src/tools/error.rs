use thiserror::Error;

use crate::engine::EngineError;
use crate::mcp::{ErrorCode, JsonRpcError};
use crate::VoxError;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidArguments(String),

    /// Engine round trip failed; `code` tells which step
    #[error("{context}: {source}")]
    Engine {
        code: ErrorCode,
        context: String,
        #[source]
        source: EngineError,
    },

    #[error("{context}: {source}")]
    FileWrite {
        context: String,
        #[source]
        source: VoxError,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ToolError::NotFound(_) | ToolError::InvalidArguments(_) => ErrorCode::InvalidParams,
            ToolError::Engine { code, .. } => *code,
            ToolError::FileWrite { .. } => ErrorCode::FileWriteFailed,
            ToolError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

impl From<ToolError> for JsonRpcError {
    fn from(err: ToolError) -> Self {
        JsonRpcError::new(err.code(), err.to_string())
    }
}

pub type ToolResult<T> = Result<T, ToolError>;
