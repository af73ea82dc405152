use async_trait::async_trait;

use crate::domain::{Conversation, DomainError, Message, NewConversation, Sender};

/// Durable conversation and message records.
///
/// Each call is an independent single-row operation; callers get no enclosing
/// transaction across calls.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn create_conversation(&self, new: &NewConversation) -> Result<Conversation, DomainError>;

    async fn find_conversation(&self, id: i64) -> Result<Option<Conversation>, DomainError>;

    /// Newest first. `q` filters titles case-insensitively.
    async fn list_conversations(
        &self,
        limit: usize,
        offset: usize,
        q: Option<&str>,
    ) -> Result<Vec<Conversation>, DomainError>;

    /// Returns `false` when no conversation has this id.
    async fn rename_conversation(&self, id: i64, title: &str) -> Result<bool, DomainError>;

    /// Appends a message and returns its id. Ids increase monotonically.
    async fn append_message(
        &self,
        conversation_id: i64,
        sender: Sender,
        content: &str,
        meta_json: Option<&str>,
    ) -> Result<i64, DomainError>;

    /// All messages of a conversation ordered by id.
    async fn messages(&self, conversation_id: i64) -> Result<Vec<Message>, DomainError>;

    async fn update_message_content(&self, message_id: i64, content: &str) -> Result<(), DomainError>;

    /// Cheap liveness probe used by status reporting.
    async fn health(&self) -> Result<(), DomainError>;
}
