mod chat;
mod conversation;
mod digest;
mod error_body;
mod export;
mod inventory;
mod pin;
mod policy;
mod slot;
mod status;

pub use chat::*;
pub use conversation::*;
pub use digest::*;
pub use error_body::*;
pub use export::*;
pub use inventory::*;
pub use pin::*;
pub use policy::*;
pub use slot::*;
pub use status::*;
