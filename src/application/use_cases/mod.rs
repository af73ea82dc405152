mod chat_turn;
mod conversations;
mod create_conversation;
mod export_conversation;
pub mod ndjson;
mod status;

pub use chat_turn::*;
pub use conversations::*;
pub use create_conversation::*;
pub use export_conversation::*;
pub use status::*;
