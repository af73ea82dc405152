#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream;
use tokio_util::sync::CancellationToken;

use pinchat::application::{ByteStream, EventSink, InferenceBackend, SinkClosed, UpstreamError};
use pinchat::domain::{
    ChatEvent, ChatRequest, Digest, LiveInventoryEntry, ManifestState, PinEntry, PinManifest,
    PinSlot, Role, Tier,
};

pub fn digest(c: char) -> Digest {
    Digest::normalize(&c.to_string().repeat(64)).expect("digest")
}

/// general.fast and coding.fast pinned; coding.thinking planned without a digest.
pub fn manifest() -> ManifestState {
    manifest_with(vec![
        PinEntry::new(PinSlot::new(Role::General, Tier::Fast), "llama3.2:3b", Some(digest('a')), true),
        PinEntry::new(PinSlot::new(Role::Coding, Tier::Fast), "qwen2.5-coder:7b", Some(digest('b')), true),
        PinEntry::new(PinSlot::new(Role::Coding, Tier::Thinking), "qwen2.5-coder:32b", None, false),
    ])
}

pub fn manifest_with(entries: Vec<PinEntry>) -> ManifestState {
    ManifestState::Loaded(Arc::new(
        PinManifest::new(None, Some("0.5.7".to_string()), entries).expect("manifest"),
    ))
}

/// What the scripted backend does when a chat stream is opened.
#[derive(Clone)]
pub enum Script {
    Chunks(Vec<Result<Vec<u8>, UpstreamError>>),
    Reject(UpstreamError),
}

impl Script {
    pub fn lines(chunks: &[&str]) -> Self {
        Script::Chunks(chunks.iter().map(|c| Ok(c.as_bytes().to_vec())).collect())
    }
}

/// In-process inference backend that replays a fixed script.
pub struct ScriptedBackend {
    script: Script,
    version: Option<String>,
    inventory: Option<Vec<LiveInventoryEntry>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            version: Some("0.5.7".to_string()),
            inventory: Some(vec![
                LiveInventoryEntry::new("llama3.2:3b", Some(digest('a'))),
                LiveInventoryEntry::new("qwen2.5-coder:7b", Some(digest('b'))),
            ]),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn offline() -> Self {
        Self {
            version: None,
            inventory: None,
            ..Self::new(Script::lines(&[]))
        }
    }

    pub fn with_inventory(mut self, inventory: Vec<LiveInventoryEntry>) -> Self {
        self.inventory = Some(inventory);
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    fn base_url(&self) -> &str {
        "http://127.0.0.1:11434"
    }

    async fn version(&self) -> Option<String> {
        self.version.clone()
    }

    async fn inventory(&self) -> Option<Vec<LiveInventoryEntry>> {
        self.inventory.clone()
    }

    async fn chat_stream(&self, request: &ChatRequest) -> Result<ByteStream, UpstreamError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        match &self.script {
            Script::Reject(err) => Err(err.clone()),
            Script::Chunks(chunks) => Ok(Box::pin(stream::iter(chunks.clone()))),
        }
    }
}

/// Collects events; optionally fires `cancel` or closes after some deltas.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<ChatEvent>,
    cancel_after: Option<(usize, CancellationToken)>,
    close_after: Option<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel_after(deltas: usize, cancel: CancellationToken) -> Self {
        Self {
            cancel_after: Some((deltas, cancel)),
            ..Self::default()
        }
    }

    pub fn close_after(deltas: usize) -> Self {
        Self {
            close_after: Some(deltas),
            ..Self::default()
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.iter().map(ChatEvent::name).collect()
    }

    pub fn deltas(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ChatEvent::Delta(delta) => Some(delta.delta_text.clone()),
                _ => None,
            })
            .collect()
    }

    fn delta_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, ChatEvent::Delta(_)))
            .count()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn send(&mut self, event: ChatEvent) -> Result<(), SinkClosed> {
        let is_delta = matches!(event, ChatEvent::Delta(_));
        if is_delta && self.close_after == Some(self.delta_count()) {
            return Err(SinkClosed);
        }
        self.events.push(event);
        if let Some((deltas, cancel)) = &self.cancel_after {
            if is_delta && self.delta_count() == *deltas {
                cancel.cancel();
            }
        }
        Ok(())
    }
}
