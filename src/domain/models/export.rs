use serde::Serialize;

use super::{Conversation, Message};

const MAX_SLUG_LEN: usize = 64;

/// JSON export document, schema version 1.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationExport {
    pub schema_version: u32,
    pub generated_utc: String,
    pub core_version: String,
    pub conversation: ExportConversation,
    pub model: ExportModel,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportConversation {
    pub id: i64,
    pub created_utc: String,
    pub title: String,
    pub role: String,
    pub tier: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportModel {
    pub tag: String,
    pub digest: String,
}

impl ConversationExport {
    pub fn new(
        conversation: &Conversation,
        messages: Vec<Message>,
        generated_utc: String,
        core_version: &str,
    ) -> Self {
        Self {
            schema_version: 1,
            generated_utc,
            core_version: core_version.to_string(),
            conversation: ExportConversation {
                id: conversation.id(),
                created_utc: conversation.created_utc().to_string(),
                title: conversation.title().to_string(),
                role: conversation.role().to_string(),
                tier: conversation.tier().to_string(),
            },
            model: ExportModel {
                tag: conversation.model_tag().to_string(),
                digest: conversation.model_digest().to_string(),
            },
            messages,
        }
    }

    /// Markdown transcript, messages in id order.
    pub fn to_markdown(&self) -> String {
        let c = &self.conversation;
        let mut md = String::new();
        md.push_str(&format!("# Conversation {}: {}\n\n", c.id, c.title));
        md.push_str(&format!("- created_utc: {}\n", c.created_utc));
        md.push_str(&format!("- role: {}\n", c.role));
        md.push_str(&format!("- tier: {}\n", c.tier));
        md.push_str(&format!("- model_tag: {}\n", self.model.tag));
        md.push_str(&format!("- model_digest: {}\n", self.model.digest));
        md.push_str("\n---\n\n");

        let mut ordered: Vec<&Message> = self.messages.iter().collect();
        ordered.sort_by_key(|m| m.id());
        for m in ordered {
            md.push_str(&format!("## {} @ {}\n\n", m.sender().as_str(), m.created_utc()));
            md.push_str(m.content());
            md.push_str("\n\n");
        }
        md
    }
}

/// File-name-safe slug for a conversation title.
/// Where an export landed on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReceipt {
    pub ok: bool,
    pub dir: String,
    pub md: String,
    pub json: String,
}

pub fn slugify(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut dash = false;

    for ch in lowered.chars() {
        if ch.is_alphanumeric() {
            out.push(ch);
            dash = false;
        } else if !dash {
            out.push('-');
            dash = true;
        }
    }

    let trimmed = out.trim_matches('-');
    let truncated: String = trimmed.chars().take(MAX_SLUG_LEN).collect();
    let slug = truncated.trim_matches('-');
    if slug.is_empty() {
        "conversation".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, Sender, Tier};

    #[test]
    fn slug_collapses_punctuation() {
        assert_eq!(slugify("  Hello,  World!! "), "hello-world");
        assert_eq!(slugify("general-fast"), "general-fast");
        assert_eq!(slugify("***"), "conversation");
        assert_eq!(slugify(""), "conversation");
    }

    #[test]
    fn slug_is_capped() {
        let long = "ab ".repeat(40);
        let slug = slugify(&long);
        assert!(slug.chars().count() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn markdown_lists_messages_in_id_order() {
        let convo = Conversation::reconstitute(
            7,
            "2026-01-01T00:00:00Z".into(),
            "Demo".into(),
            Role::General,
            Tier::Fast,
            "m:1".into(),
            "d".repeat(64),
        );
        let messages = vec![
            Message::reconstitute(2, 7, "t2".into(), Sender::Assistant, "Hi there".into(), None),
            Message::reconstitute(1, 7, "t1".into(), Sender::User, "Hello".into(), None),
        ];
        let export = ConversationExport::new(&convo, messages, "now".into(), "0.1.0");
        let md = export.to_markdown();

        assert!(md.starts_with("# Conversation 7: Demo"));
        let user_at = md.find("## user @ t1").unwrap();
        let assistant_at = md.find("## assistant @ t2").unwrap();
        assert!(user_at < assistant_at);
    }
}
