//! VOICEVOX engine access
//!
//! - `types`: query and speaker payloads exchanged with the engine
//! - `client`: the `SpeechEngine` seam and its HTTP implementation

pub mod client;
pub mod types;

pub use client::{EngineError, SpeechEngine, VoicevoxClient};
pub use types::{AudioQuery, Speaker};
