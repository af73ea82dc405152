use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::application::{ByteStream, InferenceBackend, UpstreamError};
use crate::domain::{ChatRequest, LiveInventoryEntry};

const VERSION_PATH: &str = "/api/version";
const TAGS_PATH: &str = "/api/tags";
const CHAT_PATH: &str = "/api/chat";

#[derive(Deserialize)]
struct VersionResponse {
    #[serde(default)]
    version: Option<String>,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Option<Vec<TagEntry>>,
}

#[derive(Deserialize)]
struct TagEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    digest: Option<String>,
}

/// HTTP client for an Ollama-compatible inference backend.
///
/// Two clients are kept: `probe_client` has a short total timeout for the
/// version and inventory probes, while `stream_client` has only a connect
/// timeout so long generations are never cut off.
pub struct OllamaBackend {
    probe_client: reqwest::Client,
    stream_client: reqwest::Client,
    base_url: String,
}

impl OllamaBackend {
    pub fn new(base_url: impl Into<String>, probe_timeout: Duration) -> Self {
        let base: String = base_url.into();
        Self {
            probe_client: reqwest::Client::builder()
                .connect_timeout(probe_timeout)
                .timeout(probe_timeout)
                .build()
                .unwrap_or_default(),
            stream_client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(5))
                .build()
                .unwrap_or_default(),
            base_url: base.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn probe<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Option<T> {
        let response = match self.probe_client.get(self.url(path)).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Probe {} failed: {}", path, e);
                return None;
            }
        };

        if !response.status().is_success() {
            debug!("Probe {} returned {}", path, response.status());
            return None;
        }

        match response.json::<T>().await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!("Probe {} returned an unexpected body: {}", path, e);
                None
            }
        }
    }
}

#[async_trait]
impl InferenceBackend for OllamaBackend {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn version(&self) -> Option<String> {
        let body: VersionResponse = self.probe(VERSION_PATH).await?;
        body.version
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    async fn inventory(&self) -> Option<Vec<LiveInventoryEntry>> {
        let body: TagsResponse = self.probe(TAGS_PATH).await?;
        let models = body.models?;

        Some(
            models
                .into_iter()
                .filter_map(|m| {
                    let name = m.name?;
                    Some(LiveInventoryEntry::from_raw(
                        &name,
                        m.digest.as_deref().unwrap_or_default(),
                    ))
                })
                .filter(|entry| !entry.name().is_empty())
                .collect(),
        )
    }

    async fn chat_stream(&self, request: &ChatRequest) -> Result<ByteStream, UpstreamError> {
        let response = self
            .stream_client
            .post(self.url(CHAT_PATH))
            .header(reqwest::header::ACCEPT, "application/x-ndjson")
            .json(request)
            .send()
            .await
            .map_err(|e| UpstreamError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.ok();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Streaming chat from {} for model {}", self.base_url, request.model);
        let stream = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| UpstreamError::Read(e.to_string()))
        });
        Ok(Box::pin(stream))
    }
}
