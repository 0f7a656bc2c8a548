// Local audio playback for synthesized files

pub mod player;

// Shared audio utilities
pub mod utils;

pub use player::{AudioPlayer, Playback, PlaybackError};
