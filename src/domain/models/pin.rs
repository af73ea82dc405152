use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use super::{Digest, PinSlot};
use crate::domain::DomainError;

/// Concrete model selected for a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelRef {
    tag: String,
    digest: Digest,
}

impl ModelRef {
    pub fn new(tag: impl Into<String>, digest: Digest) -> Self {
        Self {
            tag: tag.into(),
            digest,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }
}

/// One row of the pin manifest. A `None` digest marks a planned, not yet pinned model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinEntry {
    slot: PinSlot,
    tag: String,
    digest: Option<Digest>,
    required: bool,
}

impl PinEntry {
    pub fn new(slot: PinSlot, tag: impl Into<String>, digest: Option<Digest>, required: bool) -> Self {
        Self {
            slot,
            tag: tag.into(),
            digest,
            required,
        }
    }

    pub fn slot(&self) -> PinSlot {
        self.slot
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn digest(&self) -> Option<&Digest> {
        self.digest.as_ref()
    }

    pub fn required(&self) -> bool {
        self.required
    }

    /// The usable model for this entry, if it is pinned.
    pub fn model_ref(&self) -> Option<ModelRef> {
        self.digest
            .as_ref()
            .map(|digest| ModelRef::new(self.tag.clone(), digest.clone()))
    }
}

/// Immutable (role, tier) → pin table, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinManifest {
    captured_utc: Option<String>,
    backend_version: Option<String>,
    entries: BTreeMap<PinSlot, PinEntry>,
}

impl PinManifest {
    pub const SCHEMA_VERSION: u32 = 1;

    /// Build a manifest, rejecting duplicate slots.
    pub fn new(
        captured_utc: Option<String>,
        backend_version: Option<String>,
        entries: impl IntoIterator<Item = PinEntry>,
    ) -> Result<Self, DomainError> {
        let mut map = BTreeMap::new();
        for entry in entries {
            let slot = entry.slot();
            if map.insert(slot, entry).is_some() {
                return Err(DomainError::config(format!("duplicate pin for {}", slot)));
            }
        }
        Ok(Self {
            captured_utc,
            backend_version,
            entries: map,
        })
    }

    pub fn get(&self, slot: PinSlot) -> Option<&PinEntry> {
        self.entries.get(&slot)
    }

    /// Entries in stable (role, tier) order.
    pub fn entries(&self) -> impl Iterator<Item = &PinEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn captured_utc(&self) -> Option<&str> {
        self.captured_utc.as_deref()
    }

    /// Backend version the digests were captured against, if recorded.
    pub fn backend_version(&self) -> Option<&str> {
        self.backend_version.as_deref()
    }
}

/// What startup produced for the pin manifest. A missing or unreadable file is
/// a degraded state: status keeps working, conversation creation does not.
#[derive(Debug, Clone)]
pub enum ManifestState {
    Loaded(Arc<PinManifest>),
    Unavailable(String),
}

impl ManifestState {
    pub fn manifest(&self) -> Result<&PinManifest, DomainError> {
        match self {
            ManifestState::Loaded(manifest) => Ok(manifest),
            ManifestState::Unavailable(detail) => Err(DomainError::PinsUnavailable(detail.clone())),
        }
    }

    pub fn loaded(&self) -> Option<&PinManifest> {
        match self {
            ManifestState::Loaded(manifest) => Some(manifest),
            ManifestState::Unavailable(_) => None,
        }
    }
}
