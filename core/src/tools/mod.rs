pub mod error;
pub mod registry;
pub mod speakers;
pub mod speech;
pub mod traits;

// Re-export common types
pub use error::{ToolError, ToolResult};
pub use registry::ToolRegistry;
pub use speakers::GetSpeakersTool;
pub use speech::{SpeechRequest, TextToSpeechTool};
pub use traits::{Tool, ToolOutput};
