//! Process configuration
//!
//! A `Config` is assembled once at startup and never mutated afterwards.
//! Layers, each overriding the previous one:
//! 1. built-in defaults (`Config::default`)
//! 2. optional TOML file (`--config` / `MCP_VOICEVOX_CONFIG`)
//! 3. environment variables (`MCP_VOICEVOX_*`)
//! 4. command-line flags (`ConfigOverrides`)
//!
//! The result is validated and then shared as `Arc<Config>`.

use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Result, VoxError};

pub const ENV_PORT: &str = "MCP_VOICEVOX_PORT";
pub const ENV_URL: &str = "MCP_VOICEVOX_URL";
pub const ENV_TEMP_DIR: &str = "MCP_VOICEVOX_TEMP_DIR";
pub const ENV_DEFAULT_SPEAKER: &str = "MCP_VOICEVOX_DEFAULT_SPEAKER";
pub const ENV_ENABLE_PLAYBACK: &str = "MCP_VOICEVOX_ENABLE_PLAYBACK";
pub const ENV_PLAYER: &str = "MCP_VOICEVOX_PLAYER";
pub const ENV_CONFIG: &str = "MCP_VOICEVOX_CONFIG";
pub const ENV_SPEED_SCALE: &str = "MCP_VOICEVOX_DEFAULT_SPEED_SCALE";
pub const ENV_PITCH_SCALE: &str = "MCP_VOICEVOX_DEFAULT_PITCH_SCALE";
pub const ENV_INTONATION_SCALE: &str = "MCP_VOICEVOX_DEFAULT_INTONATION_SCALE";
pub const ENV_VOLUME_SCALE: &str = "MCP_VOICEVOX_DEFAULT_VOLUME_SCALE";

/// All variables read by `Config::apply_env`
pub const ENV_VARS: &[&str] = &[
    ENV_PORT,
    ENV_URL,
    ENV_TEMP_DIR,
    ENV_DEFAULT_SPEAKER,
    ENV_ENABLE_PLAYBACK,
    ENV_PLAYER,
    ENV_CONFIG,
    ENV_SPEED_SCALE,
    ENV_PITCH_SCALE,
    ENV_INTONATION_SCALE,
    ENV_VOLUME_SCALE,
];

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ENGINE_URL: &str = "http://localhost:50021";
pub const DEFAULT_SPEAKER: i64 = 3;

pub const SPEED_RANGE: RangeInclusive<f64> = 0.5..=2.0;
pub const PITCH_RANGE: RangeInclusive<f64> = -0.15..=0.15;
pub const INTONATION_RANGE: RangeInclusive<f64> = 0.0..=2.0;
pub const VOLUME_RANGE: RangeInclusive<f64> = 0.0..=2.0;

/// The four prosody scales sent to the engine
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prosody {
    pub speed: f64,
    pub pitch: f64,
    pub intonation: f64,
    pub volume: f64,
}

impl Default for Prosody {
    fn default() -> Self {
        Self {
            speed: 1.0,
            pitch: 0.0,
            intonation: 1.0,
            volume: 1.0,
        }
    }
}

impl Prosody {
    pub fn validate(&self) -> Result<()> {
        check_range("default speed scale", self.speed, &SPEED_RANGE)?;
        check_range("default pitch scale", self.pitch, &PITCH_RANGE)?;
        check_range("default intonation scale", self.intonation, &INTONATION_RANGE)?;
        check_range("default volume scale", self.volume, &VOLUME_RANGE)?;
        Ok(())
    }
}

fn check_range(name: &str, value: f64, range: &RangeInclusive<f64>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(VoxError::ConfigError(format!(
            "{} must be between {} and {}, got {}",
            name,
            range.start(),
            range.end(),
            value
        )))
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Listening port of the websocket server
    pub port: u16,
    /// Base URL of the VOICEVOX engine
    pub engine_url: String,
    /// Directory synthesized WAV files are written to
    pub temp_dir: PathBuf,
    pub default_speaker: i64,
    pub default_prosody: Prosody,
    pub enable_playback: bool,
    /// Preferred player binary (e.g. "aplay"); auto-detected when unset
    pub player: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            engine_url: DEFAULT_ENGINE_URL.to_string(),
            temp_dir: std::env::temp_dir().join("mcp-voicevox"),
            default_speaker: DEFAULT_SPEAKER,
            default_prosody: Prosody::default(),
            enable_playback: false,
            player: None,
        }
    }
}

/// Values given explicitly on the command line; `None` means "not passed"
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub port: Option<u16>,
    pub engine_url: Option<String>,
    pub temp_dir: Option<PathBuf>,
    pub default_speaker: Option<i64>,
    pub speed_scale: Option<f64>,
    pub pitch_scale: Option<f64>,
    pub intonation_scale: Option<f64>,
    pub volume_scale: Option<f64>,
    pub enable_playback: Option<bool>,
    pub player: Option<String>,
}

impl Config {
    /// Build the process configuration from all layers and validate it.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        let mut config = Self::default();

        let file = overrides
            .config_file
            .clone()
            .or_else(|| non_empty_env(ENV_CONFIG).map(PathBuf::from));
        if let Some(path) = file {
            config = config.overlay_file(&path)?;
        }

        config.apply_env()?;
        config.apply_overrides(overrides);
        config.validate()?;

        debug!(target: "config", ?config, "Configuration resolved");
        Ok(config)
    }

    /// Overlay values from a TOML file onto this configuration.
    pub fn overlay_file(self, path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            VoxError::ConfigError(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let parsed: VoxToml = toml::from_str(&raw).map_err(|e| {
            VoxError::ConfigError(format!(
                "failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;
        info!(target: "config", path = %path.display(), "Loaded TOML config");
        Ok(parsed.overlay(self))
    }

    /// Apply `MCP_VOICEVOX_*` variables from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(non_empty_env)
    }

    /// Apply environment-style variables from an arbitrary lookup.
    ///
    /// Unparsable numbers are errors. Prosody values that parse but fall
    /// outside their range are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_PORT) {
            self.port = v
                .parse::<u16>()
                .map_err(|_| VoxError::ConfigError(format!("invalid port value: {}", v)))?;
        }
        if let Some(v) = lookup(ENV_URL) {
            self.engine_url = v;
        }
        if let Some(v) = lookup(ENV_TEMP_DIR) {
            self.temp_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_DEFAULT_SPEAKER) {
            self.default_speaker = v
                .parse::<i64>()
                .map_err(|_| VoxError::ConfigError(format!("invalid speaker ID value: {}", v)))?;
        }
        if let Some(v) = lookup(ENV_ENABLE_PLAYBACK) {
            self.enable_playback = v == "true";
        }
        if let Some(v) = lookup(ENV_PLAYER) {
            self.player = Some(v);
        }

        env_scale(&lookup, ENV_SPEED_SCALE, "speed", &SPEED_RANGE, &mut self.default_prosody.speed)?;
        env_scale(&lookup, ENV_PITCH_SCALE, "pitch", &PITCH_RANGE, &mut self.default_prosody.pitch)?;
        env_scale(
            &lookup,
            ENV_INTONATION_SCALE,
            "intonation",
            &INTONATION_RANGE,
            &mut self.default_prosody.intonation,
        )?;
        env_scale(&lookup, ENV_VOLUME_SCALE, "volume", &VOLUME_RANGE, &mut self.default_prosody.volume)?;

        Ok(())
    }

    /// Apply flags that were explicitly passed on the command line.
    pub fn apply_overrides(&mut self, o: &ConfigOverrides) {
        if let Some(v) = o.port {
            self.port = v;
        }
        if let Some(v) = &o.engine_url {
            self.engine_url = v.clone();
        }
        if let Some(v) = &o.temp_dir {
            self.temp_dir = v.clone();
        }
        if let Some(v) = o.default_speaker {
            self.default_speaker = v;
        }
        if let Some(v) = o.speed_scale {
            self.default_prosody.speed = v;
        }
        if let Some(v) = o.pitch_scale {
            self.default_prosody.pitch = v;
        }
        if let Some(v) = o.intonation_scale {
            self.default_prosody.intonation = v;
        }
        if let Some(v) = o.volume_scale {
            self.default_prosody.volume = v;
        }
        if let Some(v) = o.enable_playback {
            self.enable_playback = v;
        }
        if let Some(v) = &o.player {
            self.player = Some(v.clone());
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(VoxError::ConfigError(
                "port must be between 1 and 65535, got 0".to_string(),
            ));
        }
        if self.engine_url.trim().is_empty() {
            return Err(VoxError::ConfigError(
                "voicevox URL cannot be empty".to_string(),
            ));
        }
        reqwest::Url::parse(&self.engine_url).map_err(|e| {
            VoxError::ConfigError(format!("invalid voicevox URL {}: {}", self.engine_url, e))
        })?;
        if self.default_speaker < 0 {
            return Err(VoxError::ConfigError(format!(
                "default speaker ID must be non-negative, got {}",
                self.default_speaker
            )));
        }
        if self.temp_dir.as_os_str().is_empty() {
            return Err(VoxError::ConfigError(
                "temp directory cannot be empty".to_string(),
            ));
        }
        self.default_prosody.validate()
    }

    /// Create the output directory if it does not exist yet.
    pub fn prepare_temp_dir(&self) -> Result<()> {
        if !self.temp_dir.exists() {
            fs::create_dir_all(&self.temp_dir).map_err(|e| {
                VoxError::ConfigError(format!(
                    "failed to create temp directory {}: {}",
                    self.temp_dir.display(),
                    e
                ))
            })?;
            info!(target: "config", dir = %self.temp_dir.display(), "Created temp directory");
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_scale<F>(
    lookup: &F,
    key: &str,
    name: &str,
    range: &RangeInclusive<f64>,
    slot: &mut f64,
) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup(key) {
        let parsed = v
            .parse::<f64>()
            .map_err(|_| VoxError::ConfigError(format!("invalid {} scale value: {}", name, v)))?;
        if range.contains(&parsed) {
            *slot = parsed;
        } else {
            debug!(target: "config", key, value = parsed, "Ignoring out-of-range scale");
        }
    }
    Ok(())
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, Deserialize)]
struct VoxToml {
    pub port: Option<u16>,
    pub voicevox_url: Option<String>,
    pub temp_dir: Option<PathBuf>,
    pub default_speaker: Option<i64>,
    pub enable_playback: Option<bool>,
    pub player: Option<String>,
    pub prosody: Option<ProsodyToml>,
}

impl VoxToml {
    fn overlay(self, mut base: Config) -> Config {
        if let Some(x) = self.port {
            base.port = x;
        }
        if let Some(x) = self.voicevox_url {
            base.engine_url = x;
        }
        if let Some(x) = self.temp_dir {
            base.temp_dir = x;
        }
        if let Some(x) = self.default_speaker {
            base.default_speaker = x;
        }
        if let Some(x) = self.enable_playback {
            base.enable_playback = x;
        }
        if let Some(x) = self.player {
            base.player = Some(x);
        }
        if let Some(p) = self.prosody {
            p.apply(&mut base.default_prosody);
        }
        base
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ProsodyToml {
    pub speed_scale: Option<f64>,
    pub pitch_scale: Option<f64>,
    pub intonation_scale: Option<f64>,
    pub volume_scale: Option<f64>,
}

impl ProsodyToml {
    fn apply(self, p: &mut Prosody) {
        if let Some(x) = self.speed_scale {
            p.speed = x;
        }
        if let Some(x) = self.pitch_scale {
            p.pitch = x;
        }
        if let Some(x) = self.intonation_scale {
            p.intonation = x;
        }
        if let Some(x) = self.volume_scale {
            p.volume = x;
        }
    }
}
