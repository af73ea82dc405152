use anyhow::{bail, Result};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::application::TurnOutcome;
use crate::connector::adapter::StdoutSink;

use super::super::Container;

pub struct ChatController<'a> {
    container: &'a Container,
}

impl<'a> ChatController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Streams one turn to the terminal. Ctrl-C stops the turn and keeps the partial reply.
    pub async fn chat(&self, conversation_id: i64, content: String) -> Result<String> {
        let turn = self
            .container
            .chat_turn_use_case()
            .begin(conversation_id, &content)
            .await?;

        let cancel = CancellationToken::new();
        let interrupt = cancel.clone();
        let watcher = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    debug!("Interrupted, cancelling chat turn");
                    interrupt.cancel();
                }
                _ = interrupt.cancelled() => {}
            }
        });

        let mut sink = StdoutSink::new();
        let outcome = turn.run(&mut sink, cancel.clone()).await;
        cancel.cancel();
        let _ = watcher.await;

        match outcome {
            TurnOutcome::Done => Ok(String::new()),
            TurnOutcome::Cancelled => Ok("\n(cancelled; partial reply saved)".to_string()),
            other => bail!("chat turn ended with {}", other.as_str()),
        }
    }
}
