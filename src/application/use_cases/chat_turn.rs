use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::ndjson::{extract_delta, NdjsonLines, Pull};
use crate::application::{ConversationRepository, EventSink, InferenceBackend, UpstreamError};
use crate::domain::{
    explain, ChatEvent, ChatRequest, Conversation, DomainError, ErrorBody, ManifestState,
    MetaEvent, ResolutionPolicy, Sender,
};

/// Upstream error bodies are forwarded to clients up to this many characters.
const MAX_UPSTREAM_BODY_CHARS: usize = 4096;

/// How a chat turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Done,
    UpstreamError,
    Cancelled,
    Failed,
}

impl TurnOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnOutcome::Done => "done",
            TurnOutcome::UpstreamError => "upstream_error",
            TurnOutcome::Cancelled => "cancelled",
            TurnOutcome::Failed => "internal_error",
        }
    }
}

/// Relays one chat turn from the inference backend to an event sink.
#[derive(Clone)]
pub struct ChatTurnUseCase {
    repository: Arc<dyn ConversationRepository>,
    backend: Arc<dyn InferenceBackend>,
    manifest: ManifestState,
    policy: ResolutionPolicy,
}

impl ChatTurnUseCase {
    pub fn new(
        repository: Arc<dyn ConversationRepository>,
        backend: Arc<dyn InferenceBackend>,
        manifest: ManifestState,
        policy: ResolutionPolicy,
    ) -> Self {
        Self {
            repository,
            backend,
            manifest,
            policy,
        }
    }

    /// Validates the request. Nothing is persisted when this fails.
    pub async fn begin(&self, conversation_id: i64, content: &str) -> Result<ChatTurn, DomainError> {
        if conversation_id <= 0 {
            return Err(DomainError::invalid_input("conversation_id is required"));
        }
        if content.trim().is_empty() {
            return Err(DomainError::invalid_input("content is required"));
        }

        let conversation = self
            .repository
            .find_conversation(conversation_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(format!("Conversation {} not found", conversation_id))
            })?;

        Ok(ChatTurn {
            relay: self.clone(),
            conversation,
            content: content.to_string(),
        })
    }
}

/// A validated turn, ready to run.
pub struct ChatTurn {
    relay: ChatTurnUseCase,
    conversation: Conversation,
    content: String,
}

impl ChatTurn {
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Drives the turn to a terminal state.
    ///
    /// The assistant row is written on every path that produced text. Dropping
    /// the sink's receiving side has the same effect as firing `cancel`.
    pub async fn run(self, sink: &mut dyn EventSink, cancel: CancellationToken) -> TurnOutcome {
        let conversation_id = self.conversation.id();
        let repository = Arc::clone(&self.relay.repository);

        if let Err(err) = repository
            .append_message(conversation_id, Sender::User, &self.content, None)
            .await
        {
            warn!(conversation_id, "Failed to persist user message: {}", err);
            let _ = sink.send(ChatEvent::Error(chat_failed(&err))).await;
            return finish(conversation_id, None, TurnOutcome::Failed);
        }
        debug!(conversation_id, "user message persisted");

        let history = match repository.messages(conversation_id).await {
            Ok(history) => history,
            Err(err) => {
                warn!(conversation_id, "Failed to read history: {}", err);
                let _ = sink.send(ChatEvent::Error(chat_failed(&err))).await;
                return finish(conversation_id, None, TurnOutcome::Failed);
            }
        };

        let message_id = match repository
            .append_message(conversation_id, Sender::Assistant, "", None)
            .await
        {
            Ok(id) => id,
            Err(err) => {
                warn!(conversation_id, "Failed to create assistant placeholder: {}", err);
                let _ = sink.send(ChatEvent::Error(chat_failed(&err))).await;
                return finish(conversation_id, None, TurnOutcome::Failed);
            }
        };
        debug!(conversation_id, message_id, "assistant placeholder created");

        let resolution = self
            .relay
            .manifest
            .loaded()
            .and_then(|manifest| explain(&self.relay.policy, manifest, &self.conversation));

        let meta = ChatEvent::Meta(MetaEvent {
            conversation_id,
            message_id,
            model_tag: self.conversation.model_tag().to_string(),
            model_digest: self.conversation.model_digest().to_string(),
            resolution,
        });
        if sink.send(meta).await.is_err() {
            return finish(conversation_id, Some(message_id), TurnOutcome::Cancelled);
        }
        debug!(conversation_id, message_id, "meta sent");

        let request = ChatRequest::streaming(&self.conversation, &history);
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            opened = self.relay.backend.chat_stream(&request) => Some(opened),
        };

        let stream = match opened {
            None => return finish(conversation_id, Some(message_id), TurnOutcome::Cancelled),
            Some(Ok(stream)) => stream,
            Some(Err(err)) => {
                warn!(conversation_id, message_id, "Backend rejected chat: {}", err);
                let _ = sink.send(ChatEvent::Error(upstream_error_body(&err))).await;
                return finish(conversation_id, Some(message_id), TurnOutcome::UpstreamError);
            }
        };
        debug!(conversation_id, message_id, "streaming");

        let mut lines = NdjsonLines::new(stream, cancel.clone());
        let mut accumulated = String::new();
        let mut deltas = 0usize;

        let outcome = loop {
            match lines.next_line().await {
                Pull::Line(line) => {
                    let Some(delta) = extract_delta(&line) else {
                        continue;
                    };
                    accumulated.push_str(&delta);
                    deltas += 1;
                    if sink.send(ChatEvent::delta(message_id, delta)).await.is_err() {
                        cancel.cancel();
                        break Err((TurnOutcome::Cancelled, None));
                    }
                }
                Pull::End => break Ok(()),
                Pull::Cancelled => break Err((TurnOutcome::Cancelled, None)),
                Pull::Failed(err) => {
                    warn!(conversation_id, message_id, "Backend stream failed: {}", err);
                    break Err((TurnOutcome::Failed, Some(stream_failed(&err))));
                }
            }
        };
        debug!(conversation_id, message_id, deltas, "stream finished");

        let persisted = repository
            .update_message_content(message_id, &accumulated)
            .await;

        match (outcome, persisted) {
            (Ok(()), Ok(())) => {
                let _ = sink.send(ChatEvent::done(message_id)).await;
                finish(conversation_id, Some(message_id), TurnOutcome::Done)
            }
            (Ok(()), Err(err)) => {
                warn!(conversation_id, message_id, "Failed to persist assistant reply: {}", err);
                let _ = sink.send(ChatEvent::Error(chat_failed(&err))).await;
                finish(conversation_id, Some(message_id), TurnOutcome::Failed)
            }
            (Err((outcome, error)), persisted) => {
                if let Err(err) = persisted {
                    warn!(conversation_id, message_id, "Failed to persist partial reply: {}", err);
                }
                if let Some(error) = error {
                    let _ = sink.send(ChatEvent::Error(error)).await;
                }
                finish(conversation_id, Some(message_id), outcome)
            }
        }
    }
}

fn finish(conversation_id: i64, message_id: Option<i64>, outcome: TurnOutcome) -> TurnOutcome {
    info!(
        conversation_id,
        message_id = message_id.unwrap_or_default(),
        "Chat turn ended: {}",
        outcome.as_str()
    );
    outcome
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_UPSTREAM_BODY_CHARS).collect()
}

fn upstream_error_body(err: &UpstreamError) -> ErrorBody {
    let hint = "Verify the inference backend is running and the model tag exists.";
    match err {
        UpstreamError::Status { status, body } => {
            let error = ErrorBody::new("BACKEND_ERROR", format!("Backend returned {}", status))
                .with_hint(hint);
            match body.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
                Some(body) => error.with_detail(truncate(body)),
                None => error,
            }
        }
        UpstreamError::Unreachable(detail) => {
            ErrorBody::new("BACKEND_UNREACHABLE", "Inference backend is unreachable")
                .with_detail(detail.clone())
                .with_hint(hint)
        }
        UpstreamError::Read(_) => stream_failed(err),
    }
}

fn stream_failed(err: &UpstreamError) -> ErrorBody {
    ErrorBody::new("CHAT_FAILED", "Chat failed")
        .with_detail(err.to_string())
        .with_hint("Check server logs and backend status.")
}

fn chat_failed(err: &DomainError) -> ErrorBody {
    ErrorBody::new("CHAT_FAILED", "Chat failed")
        .with_detail(err.to_error_body().message)
        .with_hint("Check server logs and backend status.")
}
