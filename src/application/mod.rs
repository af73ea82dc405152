//! # Application Layer
//!
//! Ports (traits implemented by connectors) and the use cases that orchestrate
//! domain logic over them.

pub mod interfaces;
pub mod use_cases;

pub use interfaces::*;
pub use use_cases::*;
