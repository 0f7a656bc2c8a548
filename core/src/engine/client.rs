/// VOICEVOX HTTP client
///
/// Every call is a fresh round trip: no retries, no caching and no timeout
/// beyond the transport default. The engine is expected to be a local process.
use super::types::{AudioQuery, Speaker};
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("API error: {status}, body: {body}")]
    Status { status: StatusCode, body: String },

    #[error("invalid response from {url}: {reason}, status: {status}, body: {body}")]
    Decode {
        url: String,
        status: StatusCode,
        reason: String,
        body: String,
    },
}

/// Remote operations the tools depend on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// `POST /audio_query?text=&speaker=`
    async fn audio_query(&self, text: &str, speaker: i64) -> Result<AudioQuery, EngineError>;

    /// `POST /synthesis?speaker=` with the query as JSON body; returns WAV bytes
    async fn synthesize(&self, query: &AudioQuery, speaker: i64) -> Result<Vec<u8>, EngineError>;

    /// `GET /speakers`
    async fn speakers(&self) -> Result<Vec<Speaker>, EngineError>;
}

pub struct VoicevoxClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl VoicevoxClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("vox-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self::with_client(base_url, http_client)
    }

    pub fn with_client(base_url: impl Into<String>, http_client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http_client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, EngineError> {
        let response = request.send().await.map_err(|e| {
            warn!(target: "engine", url = %url, error = %e, "Engine request failed");
            EngineError::Transport {
                url: url.to_string(),
                source: e,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(target: "engine", url = %url, status = %status, "Engine returned error status");
            return Err(EngineError::Status { status, body });
        }

        Ok(response)
    }
}

/// Longest body excerpt kept in a decode error
const BODY_EXCERPT_CHARS: usize = 512;

async fn decode_json<T: serde::de::DeserializeOwned>(
    url: String,
    response: reqwest::Response,
) -> Result<T, EngineError> {
    let status = response.status();
    let body = response.text().await.map_err(|e| EngineError::Decode {
        url: url.clone(),
        status,
        reason: e.to_string(),
        body: String::new(),
    })?;

    serde_json::from_str(&body).map_err(|e| {
        warn!(target: "engine", url = %url, error = %e, "Undecodable engine response");
        EngineError::Decode {
            url,
            status,
            reason: e.to_string(),
            body: excerpt(&body),
        }
    })
}

fn excerpt(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(BODY_EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[async_trait]
impl SpeechEngine for VoicevoxClient {
    async fn audio_query(&self, text: &str, speaker: i64) -> Result<AudioQuery, EngineError> {
        let url = self.endpoint("/audio_query");
        debug!(target: "engine", speaker, chars = text.chars().count(), "Creating audio query");

        let speaker = speaker.to_string();
        let request = self
            .http_client
            .post(&url)
            .query(&[("text", text), ("speaker", speaker.as_str())]);
        let response = self.send(&url, request).await?;

        decode_json(url, response).await
    }

    async fn synthesize(&self, query: &AudioQuery, speaker: i64) -> Result<Vec<u8>, EngineError> {
        let url = self.endpoint("/synthesis");
        debug!(target: "engine", speaker, "Synthesizing audio");

        let request = self
            .http_client
            .post(&url)
            .query(&[("speaker", speaker.to_string())])
            .header(reqwest::header::ACCEPT, "audio/wav")
            .json(query);
        let response = self.send(&url, request).await?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| EngineError::Decode {
            url,
            status,
            reason: e.to_string(),
            body: String::new(),
        })?;
        debug!(target: "engine", bytes = bytes.len(), "Received audio");
        Ok(bytes.to_vec())
    }

    async fn speakers(&self) -> Result<Vec<Speaker>, EngineError> {
        let url = self.endpoint("/speakers");
        debug!(target: "engine", "Listing speakers");

        let request = self.http_client.get(&url);
        let response = self.send(&url, request).await?;

        decode_json(url, response).await
    }
}
