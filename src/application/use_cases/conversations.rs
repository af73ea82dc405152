use std::sync::Arc;

use crate::application::ConversationRepository;
use crate::domain::{Conversation, ConversationPage, ConversationWithMessages, DomainError};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 200;

/// Browsing and renaming of stored conversations.
pub struct ConversationsUseCase {
    repository: Arc<dyn ConversationRepository>,
}

impl ConversationsUseCase {
    pub fn new(repository: Arc<dyn ConversationRepository>) -> Self {
        Self { repository }
    }

    pub async fn get(&self, id: i64) -> Result<ConversationWithMessages, DomainError> {
        let conversation = self.find(id).await?;
        let messages = self.repository.messages(id).await?;
        Ok(ConversationWithMessages {
            conversation,
            messages,
        })
    }

    pub async fn list(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
        q: Option<&str>,
    ) -> Result<ConversationPage, DomainError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = offset.unwrap_or(0);
        let q = q.map(str::trim).filter(|q| !q.is_empty());

        let items = self.repository.list_conversations(limit, offset, q).await?;
        Ok(ConversationPage {
            items,
            limit,
            offset,
            q: q.map(str::to_string),
        })
    }

    pub async fn rename(&self, id: i64, title: &str) -> Result<Conversation, DomainError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::invalid_input("Title is required"));
        }

        if !self.repository.rename_conversation(id, title).await? {
            return Err(not_found(id));
        }
        self.find(id).await
    }

    async fn find(&self, id: i64) -> Result<Conversation, DomainError> {
        self.repository
            .find_conversation(id)
            .await?
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: i64) -> DomainError {
    DomainError::not_found(format!("Conversation {} not found", id))
}
