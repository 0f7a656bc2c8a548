// WebSocket server
//
// Keeps the older tool-server vocabulary alive for existing clients:
// `invoke` and `discover` over `/ws`, plus static `/manifest` and `/health`.
// Tool execution goes through the same Dispatcher as the MCP surface.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::Method,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};
use vox_core::Dispatcher;

use crate::{BridgeError, Result};

pub const TOOL_SERVER_NAME: &str = "voicevox";
pub const TOOL_SERVER_DISPLAY_NAME: &str = "VOICEVOX";
pub const TOOL_SERVER_DESCRIPTION: &str = "Convert Japanese text to speech with VOICEVOX";

#[derive(Clone)]
pub struct SocketState {
    pub dispatcher: Arc<Dispatcher>,
    /// Port advertised in `/manifest`
    pub port: u16,
}

impl SocketState {
    pub fn new(dispatcher: Dispatcher, port: u16) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            port,
        }
    }
}

pub fn router(state: SocketState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/manifest", get(manifest_handler))
        .route("/health", get(health_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind `0.0.0.0:{port}`.
pub async fn bind(port: u16) -> Result<TcpListener> {
    let addr = format!("0.0.0.0:{}", port);
    TcpListener::bind(&addr)
        .await
        .map_err(|source| BridgeError::Bind { addr, source })
}

/// Serve until the listener fails. Connections are handled concurrently.
pub async fn serve(listener: TcpListener, state: SocketState) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(target: "socket", addr = %addr, "WebSocket server ready");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn manifest_handler(State(state): State<SocketState>) -> Json<Value> {
    Json(json!({
        "name": TOOL_SERVER_NAME,
        "display_name": TOOL_SERVER_DISPLAY_NAME,
        "description": TOOL_SERVER_DESCRIPTION,
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "1",
        "auth": { "type": "none" },
        "endpoints": {
            "ws": format!("ws://localhost:{}/ws", state.port),
            "health": format!("http://localhost:{}/health", state.port),
        }
    }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SocketState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state.dispatcher))
}

async fn handle_connection(socket: WebSocket, dispatcher: Arc<Dispatcher>) {
    info!(target: "socket", "WebSocket connection established");
    let (mut sender, mut receiver) = socket.split();

    while let Some(frame) = receiver.next().await {
        let frame = match frame {
            Ok(f) => f,
            Err(e) => {
                warn!(target: "socket", error = %e, "WebSocket read error");
                break;
            }
        };

        let (payload, binary) = match frame {
            Message::Text(text) => (text.into_bytes(), false),
            Message::Binary(bytes) => (bytes, true),
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        let request = match serde_json::from_slice::<Value>(&payload) {
            Ok(Value::Object(obj)) => Value::Object(obj),
            Ok(_) => {
                warn!(target: "socket", "Skipping non-object message");
                continue;
            }
            Err(e) => {
                warn!(target: "socket", error = %e, "JSON parse error");
                continue;
            }
        };

        let reply = handle_request(&dispatcher, &request).await;
        let reply = reply.to_string();
        let message = if binary {
            Message::Binary(reply.into_bytes())
        } else {
            Message::Text(reply)
        };

        if let Err(e) = sender.send(message).await {
            warn!(target: "socket", error = %e, "WebSocket write error");
            break;
        }
    }

    debug!(target: "socket", "WebSocket connection closed");
}

/// Answer one legacy request object with `{id, result}` or `{id, error}`.
pub async fn handle_request(dispatcher: &Dispatcher, request: &Value) -> Value {
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let method = request.get("method").and_then(Value::as_str).unwrap_or("");

    let outcome = match method {
        "invoke" => invoke(dispatcher, request.get("params")).await,
        "discover" => Ok(discover(dispatcher)),
        other => Err(format!("unknown method: {}", other)),
    };

    match outcome {
        Ok(result) => json!({ "id": id, "result": result }),
        Err(message) => {
            debug!(target: "socket", method, error = %message, "Request failed");
            json!({ "id": id, "error": message })
        }
    }
}

async fn invoke(dispatcher: &Dispatcher, params: Option<&Value>) -> std::result::Result<Value, String> {
    let params = params
        .and_then(Value::as_object)
        .ok_or_else(|| "invalid params".to_string())?;

    let name = params.get("name").and_then(Value::as_str).unwrap_or("");
    let arguments = match params.get("parameters") {
        Some(Value::Object(obj)) => Value::Object(obj.clone()),
        _ => json!({}),
    };

    dispatcher
        .call_tool(name, arguments)
        .await
        .map(|output| output.data)
        .map_err(|e| e.to_string())
}

fn discover(dispatcher: &Dispatcher) -> Value {
    let tools: Vec<Value> = dispatcher
        .tools()
        .into_iter()
        .map(|t| {
            json!({
                "name": t.name,
                "description": t.description,
                "parameters": t.input_schema,
            })
        })
        .collect();

    json!({
        "name": TOOL_SERVER_NAME,
        "display_name": TOOL_SERVER_DISPLAY_NAME,
        "description": TOOL_SERVER_DESCRIPTION,
        "tools": tools,
    })
}
