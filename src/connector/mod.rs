//! # Connector Layer
//!
//! External integrations implementing application interfaces:
//! - Storage (DuckDB, or in-memory for tests and throwaway sessions)
//! - The Ollama-compatible inference backend over HTTP
//! - Markdown/JSON exports behind a write boundary
//! - Configuration loading, the CLI container and the local HTTP API

pub mod adapter;
pub mod api;
pub mod config;

pub use adapter::*;
pub use config::{load_pin_manifest, load_settings, ConfigError, Settings};
