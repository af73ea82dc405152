use thiserror::Error;

use super::models::ErrorBody;
use super::services::{ResolutionError, UnusableReason};

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pin manifest unavailable: {0}")]
    PinsUnavailable(String),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("Write denied: {reason} ({path})")]
    Boundary { reason: String, path: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageError(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn boundary(reason: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Boundary {
            reason: reason.into(),
            path: path.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Stable machine-readable code for client-facing errors.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "BAD_REQUEST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::StorageError(_) => "STORAGE_ERROR",
            Self::Config(_) => "CONFIG_INVALID",
            Self::PinsUnavailable(_) => "PIN_MISSING",
            Self::Resolution(ResolutionError::NoUsablePin {
                reason: UnusableReason::Absent,
                ..
            }) => "PIN_NO_MATCH",
            Self::Resolution(ResolutionError::NoUsablePin {
                reason: UnusableReason::Unpinned,
                ..
            }) => "PIN_UNPINNED",
            Self::Resolution(ResolutionError::FallbackInvalid { .. }) => "PIN_FALLBACK_INVALID",
            Self::Boundary { .. } => "BOUNDARY_DENY",
            Self::IoError(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Client-facing representation: code, short message, optional detail and hint.
    pub fn to_error_body(&self) -> ErrorBody {
        let code = self.code();
        match self {
            Self::InvalidInput(msg) | Self::NotFound(msg) => ErrorBody::new(code, msg.clone()),
            Self::PinsUnavailable(detail) => ErrorBody::new(code, "Pinned model map is missing")
                .with_detail(detail.clone())
                .with_hint("Ensure the pin manifest file exists and is readable."),
            Self::Resolution(err) => {
                let detail = match err {
                    ResolutionError::NoUsablePin {
                        reason: UnusableReason::Absent,
                        ..
                    } => "No pin entry for this slot",
                    ResolutionError::NoUsablePin {
                        reason: UnusableReason::Unpinned,
                        ..
                    } => "Pin entry has no digest",
                    ResolutionError::FallbackInvalid { .. } => {
                        "Fallback slot is missing or has no digest"
                    }
                };
                let hint = match err {
                    ResolutionError::FallbackInvalid { .. } => {
                        "Point pins.fallback_role/fallback_tier at a pinned model with a digest."
                    }
                    ResolutionError::NoUsablePin { .. } => {
                        "Pin this slot in the manifest or switch pins.mode to fallback."
                    }
                };
                ErrorBody::new(code, err.to_string())
                    .with_detail(detail)
                    .with_hint(hint)
            }
            Self::Boundary { reason, path } => ErrorBody::new(code, reason.clone())
                .with_detail(path.clone())
                .with_hint("Writes are only allowed under the configured export roots."),
            Self::StorageError(_) => ErrorBody::new(code, "Storage operation failed")
                .with_hint("Check the database path and permissions."),
            Self::Config(msg) => ErrorBody::new(code, msg.clone())
                .with_hint("Fix the configuration file and restart."),
            Self::IoError(_) | Self::Internal(_) => ErrorBody::new(code, "Internal error")
                .with_hint("Check server logs."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PinSlot, Role, Tier};

    #[test]
    fn resolution_errors_map_to_distinct_codes() {
        let slot = PinSlot::new(Role::Coding, Tier::Thinking);
        let absent = DomainError::from(ResolutionError::NoUsablePin {
            slot,
            reason: UnusableReason::Absent,
        });
        let unpinned = DomainError::from(ResolutionError::NoUsablePin {
            slot,
            reason: UnusableReason::Unpinned,
        });
        let fallback = DomainError::from(ResolutionError::FallbackInvalid {
            requested: slot,
            fallback: PinSlot::new(Role::General, Tier::Fast),
        });

        assert_eq!(absent.code(), "PIN_NO_MATCH");
        assert_eq!(unpinned.code(), "PIN_UNPINNED");
        assert_eq!(fallback.code(), "PIN_FALLBACK_INVALID");
        assert!(fallback.to_error_body().hint.is_some());
    }

    #[test]
    fn storage_errors_do_not_leak_internal_messages() {
        let err = DomainError::storage("duckdb: disk I/O error at /var/lib/x");
        let body = err.to_error_body();
        assert_eq!(body.code, "STORAGE_ERROR");
        assert!(!body.message.contains("duckdb"));
        assert!(body.detail.is_none());
    }
}
