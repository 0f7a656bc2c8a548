//! Transports that carry requests to the VOICEVOX tool dispatcher.
//!
//! - `stdio`: newline-delimited JSON-RPC on stdin/stdout
//! - `socket`: WebSocket endpoint speaking the older `invoke`/`discover`
//!   vocabulary, plus `/manifest` and `/health`

pub mod socket;
pub mod stdio;

pub use socket::{bind, router, serve, SocketState};
pub use stdio::{run_lines, serve_stdio};

#[derive(thiserror::Error, Debug)]
pub enum BridgeError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Core(#[from] vox_core::VoxError),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
