//! Pull-based reader over a newline-delimited JSON response body.

use futures_util::StreamExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::application::{ByteStream, UpstreamError};

/// Result of one pull from [`NdjsonLines`].
#[derive(Debug, PartialEq, Eq)]
pub enum Pull {
    /// One complete line, without its terminator.
    Line(Vec<u8>),
    /// The far end closed the body.
    End,
    /// The cancellation token fired before or while waiting for data.
    Cancelled,
    Failed(UpstreamError),
}

/// Splits a byte stream into lines on demand.
///
/// Cancellation is checked at the start of every pull and raced against every
/// read, so a fired token stops the reader without waiting for more bytes.
pub struct NdjsonLines {
    stream: ByteStream,
    cancel: CancellationToken,
    buffer: Vec<u8>,
    finished: bool,
}

impl NdjsonLines {
    pub fn new(stream: ByteStream, cancel: CancellationToken) -> Self {
        Self {
            stream,
            cancel,
            buffer: Vec::new(),
            finished: false,
        }
    }

    pub async fn next_line(&mut self) -> Pull {
        loop {
            if self.cancel.is_cancelled() {
                return Pull::Cancelled;
            }

            if let Some(line) = self.take_line() {
                return Pull::Line(line);
            }

            if self.finished {
                if self.buffer.is_empty() {
                    return Pull::End;
                }
                let mut rest = std::mem::take(&mut self.buffer);
                strip_cr(&mut rest);
                return Pull::Line(rest);
            }

            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Pull::Cancelled,
                next = self.stream.next() => next,
            };

            match next {
                Some(Ok(chunk)) => self.buffer.extend_from_slice(&chunk),
                Some(Err(err)) => return Pull::Failed(err),
                None => self.finished = true,
            }
        }
    }

    fn take_line(&mut self) -> Option<Vec<u8>> {
        let pos = self.buffer.iter().position(|b| *b == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
        line.pop();
        strip_cr(&mut line);
        Some(line)
    }
}

fn strip_cr(line: &mut Vec<u8>) {
    if line.last() == Some(&b'\r') {
        line.pop();
    }
}

/// Content fragment carried by one upstream line, if any.
///
/// Blank lines, invalid JSON and objects without a non-empty string at
/// `message.content` are framing, not content.
pub fn extract_delta(line: &[u8]) -> Option<String> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    let value: Value = serde_json::from_slice(line).ok()?;

    if let Some(err) = value.get("error") {
        warn!("Backend reported an error inside the stream: {}", err);
    }

    match value.get("message")?.get("content")?.as_str()? {
        "" => None,
        text => Some(text.to_string()),
    }
}
