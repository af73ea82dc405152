pub mod duckdb_conversation_repository;
pub mod file_exporter;
pub mod http;
pub mod in_memory_conversation_repository;
pub mod ollama_backend;
pub mod stdout_sink;
pub mod write_boundary;

pub use duckdb_conversation_repository::DuckdbConversationRepository;
pub use file_exporter::FileExporter;
pub use in_memory_conversation_repository::InMemoryConversationRepository;
pub use ollama_backend::OllamaBackend;
pub use stdout_sink::StdoutSink;
pub use write_boundary::WriteBoundary;
