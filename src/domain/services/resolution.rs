//! Pin resolution: (role, tier, policy, manifest) → concrete model.
//!
//! Everything here is a pure function of its inputs so it can be called on every
//! request without locking or caching.

use thiserror::Error;

use crate::domain::{Conversation, ModelRef, PinManifest, PinMode, PinSlot, ResolutionPolicy};

/// Why a slot could not supply a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusableReason {
    /// No manifest entry for the slot.
    Absent,
    /// Entry exists but carries no digest.
    Unpinned,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("No usable pinned model for role={} tier={}", .slot.role, .slot.tier)]
    NoUsablePin { slot: PinSlot, reason: UnusableReason },

    #[error(
        "No usable pinned model for role={} tier={} and fallback={}",
        .requested.role,
        .requested.tier,
        .fallback
    )]
    FallbackInvalid { requested: PinSlot, fallback: PinSlot },
}

/// Successful resolution. `annotation` is set when the fallback slot was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub model: ModelRef,
    pub annotation: Option<String>,
}

impl Resolution {
    pub fn is_fallback(&self) -> bool {
        self.annotation.is_some()
    }
}

fn lookup(manifest: &PinManifest, slot: PinSlot) -> Result<ModelRef, UnusableReason> {
    let entry = manifest.get(slot).ok_or(UnusableReason::Absent)?;
    entry.model_ref().ok_or(UnusableReason::Unpinned)
}

/// Resolve `slot` against `manifest` under `policy`.
pub fn resolve(
    slot: PinSlot,
    policy: &ResolutionPolicy,
    manifest: &PinManifest,
) -> Result<Resolution, ResolutionError> {
    let reason = match lookup(manifest, slot) {
        Ok(model) => {
            return Ok(Resolution {
                model,
                annotation: None,
            })
        }
        Err(reason) => reason,
    };

    if policy.mode() == PinMode::Strict {
        return Err(ResolutionError::NoUsablePin { slot, reason });
    }

    let fallback = policy.fallback();
    match lookup(manifest, fallback) {
        Ok(model) => Ok(Resolution {
            model,
            annotation: Some(format!("fallback:{}", fallback)),
        }),
        Err(_) => Err(ResolutionError::FallbackInvalid {
            requested: slot,
            fallback,
        }),
    }
}

/// Fallback annotation for an existing conversation, if the current manifest and
/// policy would substitute a different model than the one it was created with.
pub fn explain(
    policy: &ResolutionPolicy,
    manifest: &PinManifest,
    conversation: &Conversation,
) -> Option<String> {
    let resolution = resolve(conversation.slot(), policy, manifest).ok()?;
    if conversation.uses_model(&resolution.model) {
        return None;
    }
    resolution.annotation
}
