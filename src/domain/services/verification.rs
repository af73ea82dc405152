//! Manifest checks used by status reporting. Nothing here gates conversation
//! creation or chat.

use std::collections::HashMap;
use std::fmt;

use crate::domain::{Digest, LiveInventoryEntry, PinManifest, PinSlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchKind {
    MissingTag,
    DigestMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub slot: PinSlot,
    pub tag: String,
    pub kind: MismatchKind,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MismatchKind::MissingTag => write!(f, "{}: missing model tag {}", self.slot, self.tag),
            MismatchKind::DigestMismatch => {
                write!(f, "{}: digest mismatch for {}", self.slot, self.tag)
            }
        }
    }
}

/// Outcome of comparing pinned digests with the live inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub all_match: bool,
    pub mismatches: Vec<Mismatch>,
}

impl Verdict {
    /// Mismatches joined with `"; "`, or `None` when everything matched.
    pub fn detail(&self) -> Option<String> {
        if self.mismatches.is_empty() {
            return None;
        }
        Some(
            self.mismatches
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Compare every pinned manifest entry against `inventory`.
///
/// Entries without a digest are planned, not pinned, and never affect the verdict.
pub fn verify(manifest: &PinManifest, inventory: &[LiveInventoryEntry]) -> Verdict {
    let live: HashMap<&str, Option<&Digest>> = inventory
        .iter()
        .filter(|entry| !entry.name().is_empty())
        .map(|entry| (entry.name(), entry.digest()))
        .collect();

    let mut mismatches = Vec::new();
    for entry in manifest.entries() {
        let Some(pinned) = entry.digest() else {
            continue;
        };

        let kind = match live.get(entry.tag()) {
            None => Some(MismatchKind::MissingTag),
            Some(Some(actual)) if *actual == pinned => None,
            Some(_) => Some(MismatchKind::DigestMismatch),
        };

        if let Some(kind) = kind {
            mismatches.push(Mismatch {
                slot: entry.slot(),
                tag: entry.tag().to_string(),
                kind,
            });
        }
    }

    Verdict {
        all_match: mismatches.is_empty(),
        mismatches,
    }
}

/// Whether the manifest is populated and every required entry is pinned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completeness {
    pub complete: bool,
    pub detail: Option<String>,
}

pub fn validate_completeness(manifest: &PinManifest) -> Completeness {
    if manifest.is_empty() {
        return Completeness {
            complete: false,
            detail: Some("pin manifest has no models".to_string()),
        };
    }

    let missing: Vec<String> = manifest
        .entries()
        .filter(|entry| entry.required() && entry.digest().is_none())
        .map(|entry| entry.slot().to_string())
        .collect();

    if missing.is_empty() {
        Completeness {
            complete: true,
            detail: None,
        }
    } else {
        Completeness {
            complete: false,
            detail: Some(format!("missing required pins: {}", missing.join(", "))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PinEntry, Role, Tier};

    fn digest(c: char) -> Digest {
        Digest::normalize(&c.to_string().repeat(64)).unwrap()
    }

    fn manifest(entries: Vec<PinEntry>) -> PinManifest {
        PinManifest::new(None, None, entries).unwrap()
    }

    fn general_fast() -> PinSlot {
        PinSlot::new(Role::General, Tier::Fast)
    }

    fn coding_thinking() -> PinSlot {
        PinSlot::new(Role::Coding, Tier::Thinking)
    }

    #[test]
    fn all_match_when_every_pinned_tag_is_live_with_same_digest() {
        let manifest = manifest(vec![
            PinEntry::new(general_fast(), "gen:1", Some(digest('a')), true),
            PinEntry::new(coding_thinking(), "code:2", Some(digest('b')), true),
        ]);
        let inventory = vec![
            LiveInventoryEntry::from_raw("code:2", &format!("sha256:{}", "B".repeat(64))),
            LiveInventoryEntry::from_raw("gen:1", &"a".repeat(64)),
            LiveInventoryEntry::from_raw("extra:1", &"c".repeat(64)),
        ];

        let verdict = verify(&manifest, &inventory);
        assert!(verdict.all_match);
        assert_eq!(verdict.detail(), None);
    }

    #[test]
    fn reports_missing_tags_and_digest_mismatches() {
        let manifest = manifest(vec![
            PinEntry::new(general_fast(), "gen:1", Some(digest('a')), true),
            PinEntry::new(coding_thinking(), "code:2", Some(digest('b')), true),
        ]);
        let inventory = vec![LiveInventoryEntry::from_raw("gen:1", &"f".repeat(64))];

        let verdict = verify(&manifest, &inventory);
        assert!(!verdict.all_match);
        assert_eq!(verdict.mismatches.len(), 2);
        assert_eq!(
            verdict.detail().unwrap(),
            "general.fast: digest mismatch for gen:1; coding.thinking: missing model tag code:2"
        );
    }

    #[test]
    fn live_entry_with_unparseable_digest_is_a_mismatch() {
        let manifest = manifest(vec![PinEntry::new(general_fast(), "gen:1", Some(digest('a')), true)]);
        let inventory = vec![LiveInventoryEntry::from_raw("gen:1", "garbage")];

        let verdict = verify(&manifest, &inventory);
        assert_eq!(verdict.mismatches[0].kind, MismatchKind::DigestMismatch);
    }

    #[test]
    fn unpinned_entries_never_affect_the_verdict() {
        let manifest = manifest(vec![
            PinEntry::new(general_fast(), "gen:1", Some(digest('a')), true),
            PinEntry::new(coding_thinking(), "planned:1", None, false),
        ]);
        let inventory = vec![LiveInventoryEntry::from_raw("gen:1", &"a".repeat(64))];

        assert!(verify(&manifest, &inventory).all_match);
    }

    #[test]
    fn completeness_flags_required_entries_without_digest() {
        let complete = manifest(vec![
            PinEntry::new(general_fast(), "gen:1", Some(digest('a')), true),
            PinEntry::new(coding_thinking(), "planned:1", None, false),
        ]);
        assert!(validate_completeness(&complete).complete);

        let incomplete = manifest(vec![
            PinEntry::new(general_fast(), "gen:1", Some(digest('a')), true),
            PinEntry::new(coding_thinking(), "planned:1", None, true),
        ]);
        let result = validate_completeness(&incomplete);
        assert!(!result.complete);
        assert_eq!(result.detail.as_deref(), Some("missing required pins: coding.thinking"));

        let empty = manifest(vec![]);
        assert!(!validate_completeness(&empty).complete);
    }
}
