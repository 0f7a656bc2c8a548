use httpmock::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::BufReader;
use vox_bridge::run_lines;
use vox_core::{Config, Dispatcher, VoicevoxClient};

fn dispatcher(engine_url: String, dir: &std::path::Path) -> Dispatcher {
    let config = Config {
        engine_url,
        temp_dir: dir.to_path_buf(),
        ..Config::default()
    };
    let engine = Arc::new(VoicevoxClient::new(config.engine_url.clone()));
    Dispatcher::from_config(&config, engine)
}

async fn run(dispatcher: &Dispatcher, input: &str) -> Vec<Value> {
    run_bytes(dispatcher, input.as_bytes()).await
}

async fn run_bytes(dispatcher: &Dispatcher, input: &[u8]) -> Vec<Value> {
    let mut out = Vec::new();
    run_lines(dispatcher, BufReader::new(input), &mut out)
        .await
        .unwrap();

    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[tokio::test]
async fn one_line_per_request_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher("http://127.0.0.1:9".to_string(), dir.path());

    let input = concat!(
        "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\",\"params\":{}}\n",
        "\n",
        "   \n",
        "this is not json\n",
        "{\"jsonrpc\":\"2.0\",\"id\":\"two\",\"method\":\"tools/list\"}\n",
        "{\"jsonrpc\":\"2.0\",\"method\":\"shutdown\"}\n",
    );
    let responses = run(&dispatcher, input).await;

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0]["id"], json!(1));
    assert_eq!(responses[0]["result"]["serverInfo"]["name"], "mcp-voicevox");
    assert_eq!(responses[1]["id"], json!("two"));
    assert_eq!(responses[1]["result"]["tools"].as_array().unwrap().len(), 2);
    assert_eq!(responses[2]["id"], Value::Null);
    assert_eq!(responses[2]["error"]["code"], json!(-32601));
}

#[tokio::test]
async fn invalid_utf8_line_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher("http://127.0.0.1:9".to_string(), dir.path());

    let mut input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\"}\n".to_vec();
    input.extend_from_slice(b"\xff\xfe garbage\n");
    input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"initialize\"}\n");

    let responses = run_bytes(&dispatcher, &input).await;
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], json!(1));
    assert_eq!(responses[1]["id"], json!(2));
}

#[tokio::test]
async fn last_line_without_newline_is_handled() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher("http://127.0.0.1:9".to_string(), dir.path());

    let responses = run(&dispatcher, "{\"jsonrpc\":\"2.0\",\"id\":9,\"method\":\"tools/list\"}").await;
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["id"], json!(9));
}

#[tokio::test]
async fn empty_input_produces_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher("http://127.0.0.1:9".to_string(), dir.path());

    assert!(run(&dispatcher, "").await.is_empty());
}

#[tokio::test]
async fn tool_call_writes_file_and_reports_path() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/audio_query").query_param("speaker", "3");
            then.status(200).json_body(json!({"accent_phrases": [], "speedScale": 1.0}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/synthesis").query_param("speaker", "3");
            then.status(200).body(b"RIFFdata");
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher(server.base_url(), dir.path());

    let input = "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",\"params\":{\"name\":\"text_to_speech\",\"arguments\":{\"text\":\"こんにちは\"}}}\n";
    let responses = run(&dispatcher, input).await;

    assert_eq!(responses.len(), 1);
    let text = responses[0]["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("こんにちは"));
    let path = text
        .lines()
        .find_map(|l| l.strip_prefix("File: "))
        .unwrap();
    assert!(path.contains("speech_3_"));
    assert_eq!(std::fs::read(path).unwrap(), b"RIFFdata");
}
