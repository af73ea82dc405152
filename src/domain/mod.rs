//! # Domain Layer
//!
//! Pins, conversations, chat events and the pure resolution/verification engines.
//! This layer is independent of external frameworks and infrastructure.

pub mod error;
pub mod models;
pub mod services;

pub use error::*;
pub use models::*;
pub use services::*;
