mod conversation_exporter;
mod conversation_repository;
mod event_sink;
mod inference_backend;

pub use conversation_exporter::*;
pub use conversation_repository::*;
pub use event_sink::*;
pub use inference_backend::*;
