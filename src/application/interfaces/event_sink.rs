use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ChatEvent;

/// The client side of a chat turn went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("event sink closed")]
pub struct SinkClosed;

/// Receives the typed events of one chat turn, in order.
#[async_trait]
pub trait EventSink: Send {
    async fn send(&mut self, event: ChatEvent) -> Result<(), SinkClosed>;
}
