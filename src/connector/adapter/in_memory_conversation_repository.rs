use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::ConversationRepository;
use crate::domain::{
    utc_timestamp, Conversation, DomainError, Message, NewConversation, Sender,
};

#[derive(Default)]
struct Store {
    next_conversation_id: i64,
    next_message_id: i64,
    conversations: BTreeMap<i64, Conversation>,
    messages: BTreeMap<i64, Message>,
}

/// Process-local conversation store, used with `--memory-storage` and in tests.
pub struct InMemoryConversationRepository {
    store: Arc<Mutex<Store>>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(Store::default())),
        }
    }
}

impl Default for InMemoryConversationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn create_conversation(&self, new: &NewConversation) -> Result<Conversation, DomainError> {
        let mut store = self.store.lock().await;
        store.next_conversation_id += 1;
        let id = store.next_conversation_id;

        let conversation = Conversation::reconstitute(
            id,
            new.created_utc.clone(),
            new.title.clone(),
            new.slot.role,
            new.slot.tier,
            new.model.tag().to_string(),
            new.model.digest().as_str().to_string(),
        );
        store.conversations.insert(id, conversation.clone());
        debug!("Created conversation {} in memory", id);
        Ok(conversation)
    }

    async fn find_conversation(&self, id: i64) -> Result<Option<Conversation>, DomainError> {
        let store = self.store.lock().await;
        Ok(store.conversations.get(&id).cloned())
    }

    async fn list_conversations(
        &self,
        limit: usize,
        offset: usize,
        q: Option<&str>,
    ) -> Result<Vec<Conversation>, DomainError> {
        let store = self.store.lock().await;
        let needle = q.map(str::to_lowercase);

        Ok(store
            .conversations
            .values()
            .rev()
            .filter(|c| match &needle {
                Some(needle) => c.title().to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn rename_conversation(&self, id: i64, title: &str) -> Result<bool, DomainError> {
        let mut store = self.store.lock().await;
        let Some(existing) = store.conversations.get(&id) else {
            return Ok(false);
        };

        let renamed = Conversation::reconstitute(
            existing.id(),
            existing.created_utc().to_string(),
            title.to_string(),
            existing.role(),
            existing.tier(),
            existing.model_tag().to_string(),
            existing.model_digest().to_string(),
        );
        store.conversations.insert(id, renamed);
        Ok(true)
    }

    async fn append_message(
        &self,
        conversation_id: i64,
        sender: Sender,
        content: &str,
        meta_json: Option<&str>,
    ) -> Result<i64, DomainError> {
        let mut store = self.store.lock().await;
        if !store.conversations.contains_key(&conversation_id) {
            return Err(DomainError::storage(format!(
                "conversation {} does not exist",
                conversation_id
            )));
        }

        store.next_message_id += 1;
        let id = store.next_message_id;
        store.messages.insert(
            id,
            Message::reconstitute(
                id,
                conversation_id,
                utc_timestamp(),
                sender,
                content.to_string(),
                meta_json.map(str::to_string),
            ),
        );
        Ok(id)
    }

    async fn messages(&self, conversation_id: i64) -> Result<Vec<Message>, DomainError> {
        let store = self.store.lock().await;
        Ok(store
            .messages
            .values()
            .filter(|m| m.conversation_id() == conversation_id)
            .cloned()
            .collect())
    }

    async fn update_message_content(&self, message_id: i64, content: &str) -> Result<(), DomainError> {
        let mut store = self.store.lock().await;
        let Some(existing) = store.messages.get(&message_id) else {
            return Err(DomainError::storage(format!("message {} does not exist", message_id)));
        };

        let updated = Message::reconstitute(
            existing.id(),
            existing.conversation_id(),
            existing.created_utc().to_string(),
            existing.sender(),
            content.to_string(),
            existing.meta_json().map(str::to_string),
        );
        store.messages.insert(message_id, updated);
        Ok(())
    }

    async fn health(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Digest, ModelRef, PinSlot, Role, Tier};

    fn new_conversation(title: &str) -> NewConversation {
        let model = ModelRef::new("m:1", Digest::normalize(&"a".repeat(64)).unwrap());
        NewConversation::new(PinSlot::new(Role::General, Tier::Fast), model, Some(title))
    }

    #[tokio::test]
    async fn lists_newest_first_with_title_filter() {
        let repo = InMemoryConversationRepository::new();
        for title in ["Alpha plan", "beta", "ALPHA review"] {
            repo.create_conversation(&new_conversation(title)).await.unwrap();
        }

        let all = repo.list_conversations(10, 0, None).await.unwrap();
        let ids: Vec<_> = all.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        let alpha = repo.list_conversations(10, 0, Some("alpha")).await.unwrap();
        assert_eq!(alpha.len(), 2);

        let paged = repo.list_conversations(1, 1, None).await.unwrap();
        assert_eq!(paged[0].id(), 2);
    }

    #[tokio::test]
    async fn message_content_is_mutable_in_place() {
        let repo = InMemoryConversationRepository::new();
        let conversation = repo.create_conversation(&new_conversation("t")).await.unwrap();

        let id = repo
            .append_message(conversation.id(), Sender::Assistant, "", None)
            .await
            .unwrap();
        repo.update_message_content(id, "Hello").await.unwrap();

        let messages = repo.messages(conversation.id()).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content(), "Hello");
        assert_eq!(messages[0].sender(), Sender::Assistant);
    }

    #[tokio::test]
    async fn rename_reports_unknown_ids() {
        let repo = InMemoryConversationRepository::new();
        assert!(!repo.rename_conversation(9, "x").await.unwrap());
    }
}
