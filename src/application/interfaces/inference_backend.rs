use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use thiserror::Error;

use crate::domain::{ChatRequest, LiveInventoryEntry};

/// Raw response body chunks from a streaming chat call.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, UpstreamError>> + Send>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("backend returned HTTP {status}")]
    Status { status: u16, body: Option<String> },

    #[error("backend unreachable: {0}")]
    Unreachable(String),

    #[error("failed reading backend stream: {0}")]
    Read(String),
}

/// Local inference backend (Ollama-compatible).
///
/// The probes are best-effort: a timeout, transport failure or unexpected body
/// yields `None` instead of an error.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    fn base_url(&self) -> &str;

    async fn version(&self) -> Option<String>;

    async fn inventory(&self) -> Option<Vec<LiveInventoryEntry>>;

    /// Opens one streaming chat call. A non-success status is reported before
    /// any body bytes are handed out.
    async fn chat_stream(&self, request: &ChatRequest) -> Result<ByteStream, UpstreamError>;
}
