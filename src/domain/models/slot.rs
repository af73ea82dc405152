use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Purpose axis of a model pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    General,
    Coding,
    Agent,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::General, Role::Coding, Role::Agent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::General => "general",
            Role::Coding => "coding",
            Role::Agent => "agent",
        }
    }

    /// Case-insensitive, whitespace-tolerant parse.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "general" => Some(Role::General),
            "coding" => Some(Role::Coding),
            "agent" => Some(Role::Agent),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latency/quality axis of a model pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Fast,
    Thinking,
}

impl Tier {
    pub const ALL: [Tier; 2] = [Tier::Fast, Tier::Thinking];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Fast => "fast",
            Tier::Thinking => "thinking",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fast" => Some(Tier::Fast),
            "thinking" => Some(Tier::Thinking),
            _ => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (role, tier) key into the pin manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinSlot {
    pub role: Role,
    pub tier: Tier,
}

impl PinSlot {
    pub fn new(role: Role, tier: Tier) -> Self {
        Self { role, tier }
    }

    /// Validate raw client input into a slot.
    pub fn parse(role: &str, tier: &str) -> Result<Self, DomainError> {
        let role_parsed = Role::parse(role)
            .ok_or_else(|| DomainError::invalid_input(format!("Invalid role '{}'", role)))?;
        let tier_parsed = Tier::parse(tier)
            .ok_or_else(|| DomainError::invalid_input(format!("Invalid tier '{}'", tier)))?;
        Ok(Self::new(role_parsed, tier_parsed))
    }

    /// Every slot the manifest can hold, in stable order.
    pub fn all() -> impl Iterator<Item = PinSlot> {
        Role::ALL
            .into_iter()
            .flat_map(|role| Tier::ALL.into_iter().map(move |tier| PinSlot::new(role, tier)))
    }
}

impl fmt::Display for PinSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.role, self.tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_and_whitespace_insensitive() {
        assert_eq!(Role::parse("  Coding "), Some(Role::Coding));
        assert_eq!(Tier::parse("THINKING"), Some(Tier::Thinking));
        assert_eq!(Role::parse("admin"), None);
        assert_eq!(Tier::parse(""), None);
    }

    #[test]
    fn slot_parse_reports_offending_axis() {
        let err = PinSlot::parse("general", "slow").unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("Invalid tier 'slow'"));

        let err = PinSlot::parse("boss", "fast").unwrap_err();
        assert!(err.to_string().contains("Invalid role 'boss'"));
    }

    #[test]
    fn slot_display_is_dotted() {
        assert_eq!(PinSlot::new(Role::Agent, Tier::Fast).to_string(), "agent.fast");
    }

    #[test]
    fn all_slots_cover_the_matrix() {
        assert_eq!(PinSlot::all().count(), 6);
    }
}
