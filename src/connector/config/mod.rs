//! Strict loaders for `settings.toml` and `pinned.toml`.
//!
//! Both files are read once at startup. A file that exists but does not
//! validate is fatal; nothing is coerced or silently dropped.

mod pins;
mod settings;

pub use pins::*;
pub use settings::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("{}: {message}", .path.display())]
    Invalid { path: PathBuf, message: String },
}

impl ConfigError {
    fn invalid(path: &std::path::Path, message: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

impl From<ConfigError> for crate::domain::DomainError {
    fn from(err: ConfigError) -> Self {
        crate::domain::DomainError::config(err.to_string())
    }
}
