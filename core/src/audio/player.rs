//! Best-effort playback of synthesized WAV files.
//!
//! Shells out to a platform player:
//! - macOS: `afplay`
//! - Linux: first of `paplay`, `aplay`, `mpv`, `ffplay` found on PATH
//! - Windows: PowerShell `Media.SoundPlayer`
//!
//! A configured player preference wins when it can be found.
//! Failures are returned to the caller, which reports them as status text.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;
use tracing::{debug, info, warn};

use super::utils::get_from_path;

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("no audio player found")]
    NoPlayer,

    #[error("{player} exited with {status}")]
    Exit { player: String, status: ExitStatus },

    #[error("failed to run {player}: {source}")]
    Io {
        player: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    /// Playback disabled by configuration
    Skipped,
    Played,
}

#[derive(Debug, Clone, Default)]
pub struct AudioPlayer {
    enabled: bool,
    preferred: Option<String>,
}

impl AudioPlayer {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            preferred: None,
        }
    }

    pub fn with_preferred(mut self, player: Option<String>) -> Self {
        self.preferred = player.filter(|p| !p.is_empty());
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Play `wav_path`; a no-op success when disabled.
    pub async fn play(&self, wav_path: &Path) -> Result<Playback, PlaybackError> {
        if !self.enabled {
            return Ok(Playback::Skipped);
        }

        let (program, args) = self
            .resolve(wav_path)
            .ok_or(PlaybackError::NoPlayer)?;
        let player = program.display().to_string();
        debug!(target: "audio", player = %player, file = %wav_path.display(), "Starting playback");

        let status = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| PlaybackError::Io {
                player: player.clone(),
                source: e,
            })?;

        if !status.success() {
            return Err(PlaybackError::Exit { player, status });
        }

        info!(target: "audio", file = %wav_path.display(), "Playback finished");
        Ok(Playback::Played)
    }

    fn resolve(&self, wav_path: &Path) -> Option<(PathBuf, Vec<OsString>)> {
        if let Some(pref) = &self.preferred {
            match get_from_path(pref) {
                Some(bin) => return Some(player_command(bin, wav_path)),
                None => {
                    warn!(target: "audio", player = %pref, "Preferred player not found; auto-detecting")
                }
            }
        }
        platform_player(wav_path)
    }
}

fn player_command(bin: PathBuf, wav_path: &Path) -> (PathBuf, Vec<OsString>) {
    let name = bin
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_string();
    let args = match name.as_str() {
        "mpv" => vec!["--no-video".into(), wav_path.into()],
        "ffplay" => vec!["-autoexit".into(), "-nodisp".into(), wav_path.into()],
        _ => vec![wav_path.into()],
    };
    (bin, args)
}

#[cfg(target_os = "macos")]
fn platform_player(wav_path: &Path) -> Option<(PathBuf, Vec<OsString>)> {
    get_from_path("afplay").map(|bin| player_command(bin, wav_path))
}

#[cfg(target_os = "windows")]
fn platform_player(wav_path: &Path) -> Option<(PathBuf, Vec<OsString>)> {
    let script = format!(
        "(New-Object Media.SoundPlayer '{}').PlaySync()",
        wav_path.display().to_string().replace('\'', "''")
    );
    Some((
        PathBuf::from("powershell"),
        vec!["-NoProfile".into(), "-c".into(), script.into()],
    ))
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn platform_player(wav_path: &Path) -> Option<(PathBuf, Vec<OsString>)> {
    ["paplay", "aplay", "mpv", "ffplay"]
        .iter()
        .find_map(|bin| get_from_path(bin))
        .map(|bin| player_command(bin, wav_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_player_skips() {
        let player = AudioPlayer::new(false).with_preferred(Some("aplay".into()));
        let outcome = player.play(Path::new("/nonexistent.wav")).await.unwrap();
        assert_eq!(outcome, Playback::Skipped);
    }

    #[test]
    fn player_args_follow_binary() {
        let wav = Path::new("/tmp/a.wav");
        let (_, args) = player_command(PathBuf::from("/usr/bin/ffplay"), wav);
        assert_eq!(args, vec![OsString::from("-autoexit"), "-nodisp".into(), wav.into()]);

        let (_, args) = player_command(PathBuf::from("/usr/bin/mpv"), wav);
        assert_eq!(args, vec![OsString::from("--no-video"), wav.into()]);

        let (_, args) = player_command(PathBuf::from("/usr/bin/aplay"), wav);
        assert_eq!(args, vec![OsString::from(wav)]);
    }

    #[cfg(unix)]
    fn script(dir: &Path, name: &str, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn preferred_player_success_and_failure() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("a.wav");

        let ok = AudioPlayer::new(true).with_preferred(Some(script(dir.path(), "okplay", "exit 0")));
        assert_eq!(ok.play(&wav).await.unwrap(), Playback::Played);

        let bad = AudioPlayer::new(true).with_preferred(Some(script(dir.path(), "badplay", "exit 3")));
        let err = bad.play(&wav).await.unwrap_err();
        assert!(matches!(err, PlaybackError::Exit { .. }));
        assert!(err.to_string().contains("badplay"));
    }
}
