use std::fmt;

use serde::{Deserialize, Serialize};

use super::{PinSlot, Role, Tier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinMode {
    /// Require an exact (role, tier) pin.
    #[default]
    Strict,
    /// Substitute the fallback slot when the requested one is unusable.
    Fallback,
}

impl PinMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PinMode::Strict => "strict",
            PinMode::Fallback => "fallback",
        }
    }
}

impl fmt::Display for PinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How to resolve a slot that has no usable pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionPolicy {
    mode: PinMode,
    fallback: PinSlot,
}

impl ResolutionPolicy {
    pub fn new(mode: PinMode, fallback: PinSlot) -> Self {
        Self { mode, fallback }
    }

    pub fn strict() -> Self {
        Self::default()
    }

    pub fn fallback_to(slot: PinSlot) -> Self {
        Self::new(PinMode::Fallback, slot)
    }

    pub fn mode(&self) -> PinMode {
        self.mode
    }

    pub fn fallback(&self) -> PinSlot {
        self.fallback
    }
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self::new(PinMode::Strict, PinSlot::new(Role::General, Tier::Fast))
    }
}
