use serde::Serialize;

use super::Digest;

/// One model reported by the inference backend's registry.
///
/// `digest` is `None` when the backend reported a value that does not normalize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveInventoryEntry {
    name: String,
    digest: Option<Digest>,
}

impl LiveInventoryEntry {
    pub fn new(name: impl Into<String>, digest: Option<Digest>) -> Self {
        Self {
            name: name.into(),
            digest,
        }
    }

    /// Build from raw registry values, normalizing the digest.
    pub fn from_raw(name: &str, raw_digest: &str) -> Self {
        Self::new(name.trim(), Digest::normalize(raw_digest))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn digest(&self) -> Option<&Digest> {
        self.digest.as_ref()
    }
}
