pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use cli::Commands;

pub use application::{
    ChatTurnUseCase, ConversationExporter, ConversationRepository, ConversationsUseCase,
    CreateConversationUseCase, EventSink, ExportConversationUseCase, InferenceBackend,
    StatusUseCase, TurnOutcome,
};

pub use connector::{
    DuckdbConversationRepository, FileExporter, InMemoryConversationRepository, OllamaBackend,
    StdoutSink, WriteBoundary,
};

pub use domain::{
    ChatEvent, Conversation, DomainError, ErrorBody, ManifestState, Message, PinManifest, PinSlot,
    ResolutionPolicy, Role, StatusSnapshot, Tier,
};
