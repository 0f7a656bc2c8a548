/// Integration tests for the VOICEVOX HTTP client against a stub engine
use httpmock::prelude::*;
use serde_json::json;
use vox_core::{AudioQuery, EngineError, Prosody, SpeechEngine, VoicevoxClient};

fn query_body() -> serde_json::Value {
    json!({
        "accent_phrases": [],
        "speedScale": 1.0,
        "pitchScale": 0.0,
        "intonationScale": 1.0,
        "volumeScale": 1.0,
        "prePhonemeLength": 0.1,
        "postPhonemeLength": 0.1,
        "outputSamplingRate": 24000,
        "outputStereo": false,
        "kana": "コンニチワ'"
    })
}

#[tokio::test]
async fn audio_query_sends_text_and_speaker() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/audio_query")
                .query_param("text", "こんにちは")
                .query_param("speaker", "3");
            then.status(200).json_body(query_body());
        })
        .await;

    let client = VoicevoxClient::new(server.base_url());
    let query = client.audio_query("こんにちは", 3).await.unwrap();

    mock.assert_async().await;
    assert_eq!(query.scale(AudioQuery::SPEED_SCALE), Some(1.0));
    assert_eq!(query.get("kana"), Some(&json!("コンニチワ'")));
}

#[tokio::test]
async fn synthesize_posts_query_and_returns_raw_bytes() {
    let server = MockServer::start_async().await;
    let wav = b"RIFF\x24\x00\x00\x00WAVEfmt \x10\x00\x00\x00".to_vec();

    let mut query: AudioQuery = serde_json::from_value(query_body()).unwrap();
    query.apply_prosody(&Prosody {
        speed: 1.5,
        pitch: 0.1,
        intonation: 1.0,
        volume: 0.8,
    });
    let expected_body = serde_json::to_value(&query).unwrap();

    let body = wav.clone();
    let mock = server
        .mock_async(move |when, then| {
            when.method(POST)
                .path("/synthesis")
                .query_param("speaker", "8")
                .json_body(expected_body);
            then.status(200)
                .header("content-type", "audio/wav")
                .body(body);
        })
        .await;

    let client = VoicevoxClient::new(format!("{}/", server.base_url()));
    let audio = client.synthesize(&query, 8).await.unwrap();

    mock.assert_async().await;
    assert_eq!(audio, wav);
}

#[tokio::test]
async fn non_success_status_carries_code_and_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/audio_query");
            then.status(500).body("internal failure");
        })
        .await;

    let client = VoicevoxClient::new(server.base_url());
    let err = client.audio_query("x", 1).await.unwrap_err();

    match &err {
        EngineError::Status { status, body } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "internal failure");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.to_string().starts_with("API error: 500"));
}

#[tokio::test]
async fn speakers_are_decoded_with_extra_fields() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/speakers");
            then.status(200).json_body(json!([
                {
                    "name": "四国めたん",
                    "speaker_uuid": "7ffcb7ce",
                    "styles": [{"name": "ノーマル", "id": 2}],
                    "version": "0.14.0"
                },
                {
                    "name": "ずんだもん",
                    "speaker_uuid": "388f246b",
                    "styles": [{"name": "ノーマル", "id": 3}],
                    "version": "0.14.0"
                }
            ]));
        })
        .await;

    let client = VoicevoxClient::new(server.base_url());
    let speakers = client.speakers().await.unwrap();

    assert_eq!(speakers.len(), 2);
    assert_eq!(speakers[0].name, "四国めたん");
    assert_eq!(speakers[1].extra["styles"][0]["id"], json!(3));
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/speakers");
            then.status(200).body("not json");
        })
        .await;

    let client = VoicevoxClient::new(server.base_url());
    let err = client.speakers().await.unwrap_err();
    match &err {
        EngineError::Decode { status, body, .. } => {
            assert_eq!(status.as_u16(), 200);
            assert_eq!(body, "not json");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.to_string().contains("body: not json"));
}

#[tokio::test]
async fn unreachable_engine_is_a_transport_error() {
    // Nothing listens on port 9 (discard) in the test environment
    let client = VoicevoxClient::new("http://127.0.0.1:9");
    let err = client.speakers().await.unwrap_err();
    assert!(matches!(err, EngineError::Transport { .. }));
}
