use std::io::Write;

use async_trait::async_trait;

use crate::application::{EventSink, SinkClosed};
use crate::domain::{short_digest, ChatEvent};

/// Prints chat events to the terminal as they arrive.
///
/// Deltas go to stdout unbuffered; meta and error lines go to stderr so the
/// reply can be piped on its own.
#[derive(Default)]
pub struct StdoutSink;

impl StdoutSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventSink for StdoutSink {
    async fn send(&mut self, event: ChatEvent) -> Result<(), SinkClosed> {
        match event {
            ChatEvent::Meta(meta) => {
                let digest = short_digest(&meta.model_digest);
                match &meta.resolution {
                    Some(note) => eprintln!("[{} @ {}] {}", meta.model_tag, digest, note),
                    None => eprintln!("[{} @ {}]", meta.model_tag, digest),
                }
            }
            ChatEvent::Delta(delta) => {
                let mut stdout = std::io::stdout().lock();
                stdout
                    .write_all(delta.delta_text.as_bytes())
                    .and_then(|_| stdout.flush())
                    .map_err(|_| SinkClosed)?;
            }
            ChatEvent::Done(_) => println!(),
            ChatEvent::Error(body) => {
                eprintln!();
                eprintln!("error [{}]: {}", body.code, body.message);
                if let Some(detail) = &body.detail {
                    eprintln!("  {}", detail);
                }
            }
        }
        Ok(())
    }
}
