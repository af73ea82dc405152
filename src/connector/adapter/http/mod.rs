//! Local HTTP API: JSON endpoints plus the SSE chat stream.

mod error;
mod server;
mod sse;

pub use error::{status_for_code, ApiError};
pub use server::{router, serve};
pub use sse::ChannelSink;
