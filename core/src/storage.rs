//! Output storage for synthesized audio
//!
//! Files are written under the configured temp directory and never cleaned
//! up by this process.
//!
//! `FileNaming::PerSpeaker` uses whole seconds, so two calls for the same
//! speaker within one second write to the same path and the later one wins.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tracing::debug;

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileNaming {
    /// `speech_{speaker}_{unix_seconds}.wav`
    #[default]
    PerSpeaker,
    /// `voicevox_{unix_nanos}.wav`, used by the websocket surface
    Legacy,
}

impl FileNaming {
    pub fn file_name(&self, speaker: i64) -> String {
        let now = Utc::now();
        match self {
            FileNaming::PerSpeaker => format!("speech_{}_{}.wav", speaker, now.timestamp()),
            FileNaming::Legacy => format!(
                "voicevox_{}.wav",
                now.timestamp_nanos_opt().unwrap_or_else(|| now.timestamp_micros() * 1000)
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AudioStore {
    dir: PathBuf,
    naming: FileNaming,
}

impl AudioStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            naming: FileNaming::default(),
        }
    }

    pub fn with_naming(mut self, naming: FileNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn naming(&self) -> FileNaming {
        self.naming
    }

    /// Write `audio` verbatim and return the path it was written to.
    pub async fn save(&self, speaker: i64, audio: &[u8]) -> Result<PathBuf> {
        let path = self.dir.join(self.naming.file_name(speaker));
        fs::write(&path, audio).await?;
        debug!(target: "storage", path = %path.display(), bytes = audio.len(), "Saved audio");
        Ok(path)
    }
}
