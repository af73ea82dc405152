use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{ModelRef, PinSlot, Role, Tier};

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "assistant" => Sender::Assistant,
            "user" => Sender::User,
            unknown => {
                warn!("Unknown message sender '{}', treating as user", unknown);
                Sender::User
            }
        }
    }
}

/// A conversation record. The model tag and digest are frozen at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversation {
    id: i64,
    created_utc: String,
    title: String,
    role: Role,
    tier: Tier,
    model_tag: String,
    model_digest: String,
}

impl Conversation {
    /// Reconstitutes from persisted data (used by adapters).
    pub fn reconstitute(
        id: i64,
        created_utc: String,
        title: String,
        role: Role,
        tier: Tier,
        model_tag: String,
        model_digest: String,
    ) -> Self {
        Self {
            id,
            created_utc,
            title,
            role,
            tier,
            model_tag,
            model_digest,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn created_utc(&self) -> &str {
        &self.created_utc
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn slot(&self) -> PinSlot {
        PinSlot::new(self.role, self.tier)
    }

    pub fn model_tag(&self) -> &str {
        &self.model_tag
    }

    pub fn model_digest(&self) -> &str {
        &self.model_digest
    }

    /// Whether `model` is the exact build this conversation was created with.
    pub fn uses_model(&self, model: &ModelRef) -> bool {
        self.model_tag == model.tag() && self.model_digest == model.digest().as_str()
    }
}

/// Insert payload for a new conversation.
#[derive(Debug, Clone)]
pub struct NewConversation {
    pub created_utc: String,
    pub title: String,
    pub slot: PinSlot,
    pub model: ModelRef,
}

impl NewConversation {
    /// Blank titles default to `<role>-<tier>`.
    pub fn new(slot: PinSlot, model: ModelRef, title: Option<&str>) -> Self {
        let title = title.map(str::trim).unwrap_or_default();
        let title = if title.is_empty() {
            format!("{}-{}", slot.role, slot.tier)
        } else {
            title.to_string()
        };
        Self {
            created_utc: utc_timestamp(),
            title,
            slot,
            model,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    id: i64,
    conversation_id: i64,
    created_utc: String,
    sender: Sender,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta_json: Option<String>,
}

impl Message {
    pub fn reconstitute(
        id: i64,
        conversation_id: i64,
        created_utc: String,
        sender: Sender,
        content: String,
        meta_json: Option<String>,
    ) -> Self {
        Self {
            id,
            conversation_id,
            created_utc,
            sender,
            content,
            meta_json,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn conversation_id(&self) -> i64 {
        self.conversation_id
    }

    pub fn created_utc(&self) -> &str {
        &self.created_utc
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn meta_json(&self) -> Option<&str> {
        self.meta_json.as_deref()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationWithMessages {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

/// One page of the conversation list.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationPage {
    pub items: Vec<Conversation>,
    pub limit: usize,
    pub offset: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
}

/// Current UTC time as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn utc_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Digest;

    fn model() -> ModelRef {
        ModelRef::new("m:1", Digest::normalize(&"b".repeat(64)).unwrap())
    }

    #[test]
    fn blank_title_defaults_to_slot_name() {
        let slot = PinSlot::new(Role::Coding, Tier::Thinking);
        assert_eq!(NewConversation::new(slot, model(), None).title, "coding-thinking");
        assert_eq!(NewConversation::new(slot, model(), Some("   ")).title, "coding-thinking");
        assert_eq!(NewConversation::new(slot, model(), Some(" Plan ")).title, "Plan");
    }

    #[test]
    fn timestamp_has_second_precision() {
        let ts = utc_timestamp();
        assert_eq!(ts.len(), 20);
        assert!(ts.ends_with('Z'));
        assert_eq!(&ts[10..11], "T");
    }

    #[test]
    fn sender_parsing_falls_back_to_user() {
        assert_eq!(Sender::from_str("Assistant"), Sender::Assistant);
        assert_eq!(Sender::from_str("system"), Sender::User);
    }

    #[test]
    fn uses_model_compares_tag_and_digest() {
        let convo = Conversation::reconstitute(
            1,
            utc_timestamp(),
            "t".into(),
            Role::General,
            Tier::Fast,
            "m:1".into(),
            "b".repeat(64),
        );
        assert!(convo.uses_model(&model()));
        let other = ModelRef::new("m:1", Digest::normalize(&"c".repeat(64)).unwrap());
        assert!(!convo.uses_model(&other));
    }
}
