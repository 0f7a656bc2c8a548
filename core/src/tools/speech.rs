use crate::audio::{AudioPlayer, Playback};
use crate::config::{
    Config, Prosody, INTONATION_RANGE, PITCH_RANGE, SPEED_RANGE, VOLUME_RANGE,
};
use crate::engine::SpeechEngine;
use crate::mcp::ErrorCode;
use crate::storage::AudioStore;
use crate::tools::{Tool, ToolError, ToolOutput, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::{info, warn};

// ─────────────────────────────────────────────────────────────────────────────
// argument validation
// ─────────────────────────────────────────────────────────────────────────────

/// Validated `text_to_speech` arguments with defaults applied
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub speaker: i64,
    pub prosody: Prosody,
}

impl SpeechRequest {
    /// Validate raw tool arguments.
    ///
    /// `text` must be a non-empty string. `speaker_id` falls back to
    /// `default_speaker` unless numeric. Each scale override is used only
    /// when numeric and inside its range; anything else keeps the default.
    pub fn from_arguments(
        arguments: &Value,
        default_speaker: i64,
        defaults: &Prosody,
    ) -> ToolResult<Self> {
        let empty = Map::new();
        let args = arguments.as_object().unwrap_or(&empty);

        let text = args
            .get("text")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("text parameter is required".to_string()))?;

        let speaker = args
            .get("speaker_id")
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f.trunc() as i64)))
            .unwrap_or(default_speaker);

        let prosody = Prosody {
            speed: scale_override(args, "speed_scale", &SPEED_RANGE, defaults.speed),
            pitch: scale_override(args, "pitch_scale", &PITCH_RANGE, defaults.pitch),
            intonation: scale_override(
                args,
                "intonation_scale",
                &INTONATION_RANGE,
                defaults.intonation,
            ),
            volume: scale_override(args, "volume_scale", &VOLUME_RANGE, defaults.volume),
        };

        Ok(Self {
            text: text.to_string(),
            speaker,
            prosody,
        })
    }
}

fn scale_override(
    args: &Map<String, Value>,
    key: &str,
    range: &RangeInclusive<f64>,
    default: f64,
) -> f64 {
    args.get(key)
        .and_then(Value::as_f64)
        .filter(|v| range.contains(v))
        .unwrap_or(default)
}

// ─────────────────────────────────────────────────────────────────────────────
// text_to_speech
// ─────────────────────────────────────────────────────────────────────────────

pub struct TextToSpeechTool {
    engine: Arc<dyn SpeechEngine>,
    store: AudioStore,
    player: AudioPlayer,
    default_speaker: i64,
    default_prosody: Prosody,
}

impl TextToSpeechTool {
    pub fn new(
        config: &Config,
        engine: Arc<dyn SpeechEngine>,
        store: AudioStore,
        player: AudioPlayer,
    ) -> Self {
        Self {
            engine,
            store,
            player,
            default_speaker: config.default_speaker,
            default_prosody: config.default_prosody,
        }
    }

    async fn speak(&self, request: &SpeechRequest) -> ToolResult<ToolOutput> {
        let mut query = self
            .engine
            .audio_query(&request.text, request.speaker)
            .await
            .map_err(|e| ToolError::Engine {
                code: ErrorCode::EngineUnreachable,
                context: "Failed to create audio query".to_string(),
                source: e,
            })?;
        query.apply_prosody(&request.prosody);

        let audio = self
            .engine
            .synthesize(&query, request.speaker)
            .await
            .map_err(|e| ToolError::Engine {
                code: ErrorCode::SynthesisFailed,
                context: "Failed to synthesize speech".to_string(),
                source: e,
            })?;

        let path = self
            .store
            .save(request.speaker, &audio)
            .await
            .map_err(|e| ToolError::FileWrite {
                context: "Failed to save audio file".to_string(),
                source: e,
            })?;

        info!(
            target: "speech",
            speaker = request.speaker,
            bytes = audio.len(),
            path = %path.display(),
            "Synthesized speech"
        );

        let status = match self.player.play(&path).await {
            Ok(Playback::Skipped) => "saved".to_string(),
            Ok(Playback::Played) => "saved and played".to_string(),
            Err(e) => {
                warn!(target: "speech", error = %e, "Audio playback failed");
                format!("saved but playback failed: {}", e)
            }
        };

        let p = &request.prosody;
        let path_str = path.display().to_string();
        let text = format!(
            "Speech synthesis completed.\nText: {}\nSpeaker ID: {}\nSpeed: {:.2}\nPitch: {:.2}\nIntonation: {:.2}\nVolume: {:.2}\nFile: {}\nStatus: {}",
            request.text,
            request.speaker,
            p.speed,
            p.pitch,
            p.intonation,
            p.volume,
            path_str,
            status
        );

        Ok(ToolOutput {
            text,
            data: json!({
                "audio_path": path_str,
                "text": request.text,
                "speaker_id": request.speaker,
                "speed_scale": p.speed,
                "pitch_scale": p.pitch,
                "intonation_scale": p.intonation,
                "volume_scale": p.volume,
                "playback": status,
            }),
        })
    }
}

#[async_trait]
impl Tool for TextToSpeechTool {
    fn name(&self) -> String {
        "text_to_speech".to_string()
    }

    fn description(&self) -> String {
        "Convert text to speech with VOICEVOX and save it as a WAV file".to_string()
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "Text to convert to speech",
                    "maxLength": 1000
                },
                "speaker_id": {
                    "type": "integer",
                    "description": "Speaker ID (defaults to the configured speaker)",
                    "minimum": 0
                },
                "speed_scale": {
                    "type": "number",
                    "description": "Speaking speed (0.5-2.0, default: 1.0)",
                    "minimum": 0.5,
                    "maximum": 2.0
                },
                "pitch_scale": {
                    "type": "number",
                    "description": "Pitch (-0.15-0.15, default: 0.0)",
                    "minimum": -0.15,
                    "maximum": 0.15
                },
                "intonation_scale": {
                    "type": "number",
                    "description": "Intonation (0.0-2.0, default: 1.0)",
                    "minimum": 0.0,
                    "maximum": 2.0
                },
                "volume_scale": {
                    "type": "number",
                    "description": "Volume (0.0-2.0, default: 1.0)",
                    "minimum": 0.0,
                    "maximum": 2.0
                }
            },
            "required": ["text"]
        })
    }

    async fn call(&self, arguments: Value) -> ToolResult<ToolOutput> {
        let request =
            SpeechRequest::from_arguments(&arguments, self.default_speaker, &self.default_prosody)?;
        self.speak(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Prosody {
        Prosody {
            speed: 1.1,
            pitch: 0.05,
            intonation: 0.9,
            volume: 1.2,
        }
    }

    #[test]
    fn omitted_fields_use_defaults() {
        let req = SpeechRequest::from_arguments(&json!({"text": "hi"}), 3, &defaults()).unwrap();
        assert_eq!(req.text, "hi");
        assert_eq!(req.speaker, 3);
        assert_eq!(req.prosody, defaults());
    }

    #[test]
    fn in_range_overrides_apply() {
        let req = SpeechRequest::from_arguments(
            &json!({
                "text": "hi",
                "speaker_id": 8,
                "speed_scale": 2.0,
                "pitch_scale": -0.15,
                "intonation_scale": 0,
                "volume_scale": 0.5
            }),
            3,
            &defaults(),
        )
        .unwrap();
        assert_eq!(req.speaker, 8);
        assert_eq!(
            req.prosody,
            Prosody {
                speed: 2.0,
                pitch: -0.15,
                intonation: 0.0,
                volume: 0.5
            }
        );
    }

    #[test]
    fn out_of_range_overrides_fall_back_to_defaults() {
        let cases = [
            json!({"text": "a", "speed_scale": 0.49}),
            json!({"text": "a", "speed_scale": 2.01}),
            json!({"text": "a", "pitch_scale": 0.16}),
            json!({"text": "a", "pitch_scale": -0.2}),
            json!({"text": "a", "intonation_scale": -0.01}),
            json!({"text": "a", "intonation_scale": 5}),
            json!({"text": "a", "volume_scale": 2.5}),
            json!({"text": "a", "volume_scale": -1}),
        ];
        for args in cases {
            let req = SpeechRequest::from_arguments(&args, 3, &defaults()).unwrap();
            assert_eq!(req.prosody, defaults(), "args: {}", args);
        }
    }

    #[test]
    fn non_numeric_overrides_are_ignored() {
        let req = SpeechRequest::from_arguments(
            &json!({"text": "a", "speaker_id": "5", "speed_scale": "1.5", "volume_scale": true}),
            3,
            &defaults(),
        )
        .unwrap();
        assert_eq!(req.speaker, 3);
        assert_eq!(req.prosody, defaults());
    }

    #[test]
    fn fractional_speaker_is_truncated() {
        let req =
            SpeechRequest::from_arguments(&json!({"text": "a", "speaker_id": 2.7}), 3, &defaults())
                .unwrap();
        assert_eq!(req.speaker, 2);
    }

    #[test]
    fn text_must_be_non_empty_string() {
        for args in [
            json!({}),
            json!({"text": 123}),
            json!({"text": ""}),
            json!(null),
            json!(["text"]),
        ] {
            let err = SpeechRequest::from_arguments(&args, 3, &defaults()).unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidParams);
            assert_eq!(err.to_string(), "text parameter is required");
        }
    }
}
