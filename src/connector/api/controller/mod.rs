pub mod chat_controller;
pub mod conversation_controller;
pub mod export_controller;
pub mod resolve_controller;
pub mod status_controller;

pub use chat_controller::ChatController;
pub use conversation_controller::ConversationController;
pub use export_controller::ExportController;
pub use resolve_controller::ResolveController;
pub use status_controller::StatusController;
