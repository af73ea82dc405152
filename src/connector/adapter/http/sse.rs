use std::convert::Infallible;
use std::future::Future;

use async_trait::async_trait;
use axum::response::sse::{Event, Sse};
use futures_util::stream::{self, Stream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::application::{EventSink, SinkClosed};
use crate::domain::ChatEvent;

const EVENT_BUFFER: usize = 64;

/// Event sink backed by a bounded channel drained by an SSE response.
pub struct ChannelSink {
    tx: mpsc::Sender<ChatEvent>,
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn send(&mut self, event: ChatEvent) -> Result<(), SinkClosed> {
        self.tx.send(event).await.map_err(|_| SinkClosed)
    }
}

/// Spawns `relay` with a sink and a cancellation token and returns the SSE
/// response that drains the sink.
///
/// The token fires as soon as the response stream is dropped, which is how a
/// client hangup reaches the relay while it is waiting on the backend. The
/// stream ends once the relay task finishes, including when it panics.
pub fn spawn_relay<F, Fut>(relay: F) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    F: FnOnce(ChannelSink, CancellationToken) -> Fut + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Sse::new(relay_events(relay))
}

fn relay_events<F, Fut>(relay: F) -> impl Stream<Item = Result<Event, Infallible>>
where
    F: FnOnce(ChannelSink, CancellationToken) -> Fut + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<ChatEvent>(EVENT_BUFFER);
    let cancel = CancellationToken::new();

    let watcher = tx.clone();
    let mut task = tokio::spawn(relay(ChannelSink { tx }, cancel.clone()));
    tokio::spawn(async move {
        tokio::select! {
            _ = watcher.closed() => cancel.cancel(),
            joined = &mut task => {
                if let Err(err) = joined {
                    error!("Chat relay task failed: {}", err);
                }
            }
        }
    });

    stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        Some((Ok::<_, Infallible>(to_sse(&event)), rx))
    })
}

fn to_sse(event: &ChatEvent) -> Event {
    Event::default().event(event.name()).data(event.payload_json())
}
