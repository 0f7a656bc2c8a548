use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::Prosody;

/// Intermediate synthesis query returned by `/audio_query`.
///
/// Held as an opaque JSON object so accent phrases and any fields added by
/// newer engine versions round-trip to `/synthesis` untouched. Only the four
/// scale fields are ever rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioQuery(Map<String, Value>);

impl AudioQuery {
    pub const SPEED_SCALE: &'static str = "speedScale";
    pub const PITCH_SCALE: &'static str = "pitchScale";
    pub const INTONATION_SCALE: &'static str = "intonationScale";
    pub const VOLUME_SCALE: &'static str = "volumeScale";

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn scale(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    /// Overwrite the four prosody fields with resolved values
    pub fn apply_prosody(&mut self, prosody: &Prosody) {
        self.0.insert(Self::SPEED_SCALE.into(), Value::from(prosody.speed));
        self.0.insert(Self::PITCH_SCALE.into(), Value::from(prosody.pitch));
        self.0
            .insert(Self::INTONATION_SCALE.into(), Value::from(prosody.intonation));
        self.0.insert(Self::VOLUME_SCALE.into(), Value::from(prosody.volume));
    }
}

/// Speaker entry from `/speakers`; passed through without interpretation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speaker {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_name: Option<String>,
    /// Anything else the engine reports (uuid, styles, version, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn apply_prosody_keeps_unknown_fields() {
        let mut query: AudioQuery = serde_json::from_value(json!({
            "accent_phrases": [{"moras": [], "accent": 1}],
            "speedScale": 1.0,
            "pitchScale": 0.0,
            "intonationScale": 1.0,
            "volumeScale": 1.0,
            "outputSamplingRate": 24000,
            "kana": "コンニチワ'"
        }))
        .unwrap();

        query.apply_prosody(&Prosody {
            speed: 1.5,
            pitch: 0.1,
            intonation: 0.5,
            volume: 2.0,
        });

        assert_eq!(query.scale(AudioQuery::SPEED_SCALE), Some(1.5));
        assert_eq!(query.scale(AudioQuery::PITCH_SCALE), Some(0.1));
        assert_eq!(query.scale(AudioQuery::INTONATION_SCALE), Some(0.5));
        assert_eq!(query.scale(AudioQuery::VOLUME_SCALE), Some(2.0));
        assert_eq!(query.get("outputSamplingRate"), Some(&json!(24000)));
        assert_eq!(query.get("kana"), Some(&json!("コンニチワ'")));
        assert_eq!(
            query.get("accent_phrases"),
            Some(&json!([{"moras": [], "accent": 1}]))
        );
    }

    #[test]
    fn speaker_passes_through_extra_fields() {
        let raw = json!({
            "name": "四国めたん",
            "speaker_id": 2,
            "style_id": 2,
            "style_name": "ノーマル",
            "speaker_uuid": "7ffcb7ce"
        });
        let speaker: Speaker = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(speaker.name, "四国めたん");
        assert_eq!(speaker.speaker_id, Some(2));
        assert_eq!(serde_json::to_value(&speaker).unwrap(), raw);
    }
}
