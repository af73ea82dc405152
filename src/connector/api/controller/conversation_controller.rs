use anyhow::Result;

use crate::domain::{short_digest, Conversation, ConversationPage, ConversationWithMessages};

use super::super::Container;

pub struct ConversationController<'a> {
    container: &'a Container,
}

impl<'a> ConversationController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn create(&self, role: String, tier: String, title: Option<String>) -> Result<String> {
        let conversation = self
            .container
            .create_conversation_use_case()
            .execute(&role, &tier, title.as_deref())
            .await?;
        Ok(format!("Created {}", self.format_line(&conversation)))
    }

    pub async fn list(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
        query: Option<String>,
    ) -> Result<String> {
        let page = self
            .container
            .conversations_use_case()
            .list(limit, offset, query.as_deref())
            .await?;
        Ok(self.format_page(&page))
    }

    pub async fn show(&self, id: i64) -> Result<String> {
        let thread = self.container.conversations_use_case().get(id).await?;
        Ok(self.format_thread(&thread))
    }

    pub async fn rename(&self, id: i64, title: String) -> Result<String> {
        let conversation = self
            .container
            .conversations_use_case()
            .rename(id, &title)
            .await?;
        Ok(format!("Renamed {}", self.format_line(&conversation)))
    }

    fn format_line(&self, conversation: &Conversation) -> String {
        format!(
            "#{} \"{}\" [{}] {}@{}",
            conversation.id(),
            conversation.title(),
            conversation.slot(),
            conversation.model_tag(),
            short_digest(conversation.model_digest())
        )
    }

    fn format_page(&self, page: &ConversationPage) -> String {
        if page.items.is_empty() {
            return "No conversations found.".to_string();
        }

        let mut output = format!("Conversations ({} shown):\n\n", page.items.len());
        for conversation in &page.items {
            output.push_str(&format!(
                "  {}\n    Created: {}\n",
                self.format_line(conversation),
                conversation.created_utc()
            ));
        }
        output
    }

    fn format_thread(&self, thread: &ConversationWithMessages) -> String {
        let mut output = format!("{}\n", self.format_line(&thread.conversation));
        if thread.messages.is_empty() {
            output.push_str("\n(no messages)\n");
            return output;
        }

        for message in &thread.messages {
            output.push_str(&format!(
                "\n[{}] {}:\n",
                message.created_utc(),
                message.sender().as_str()
            ));
            for line in message.content().lines() {
                output.push_str(&format!("  {}\n", line));
            }
        }
        output
    }
}
