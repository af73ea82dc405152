use std::sync::Arc;

use pinchat::domain::{Digest, ModelRef, NewConversation, PinSlot, Role, Sender, Tier};
use pinchat::{ConversationRepository, DuckdbConversationRepository};
use tempfile::tempdir;

fn new_conversation(title: Option<&str>) -> NewConversation {
    let model = ModelRef::new(
        "llama3.2:3b",
        Digest::normalize(&"c".repeat(64)).expect("digest"),
    );
    NewConversation::new(PinSlot::new(Role::Coding, Tier::Fast), model, title)
}

#[tokio::test]
async fn duckdb_conversation_roundtrip_survives_reopen() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("nested").join("pinchat.duckdb");

    let id = {
        let repo = DuckdbConversationRepository::new(&db_path).expect("duckdb init");
        let conversation = repo
            .create_conversation(&new_conversation(Some("Borrow checker notes")))
            .await
            .expect("create");
        repo.append_message(conversation.id(), Sender::User, "why?", None)
            .await
            .expect("append");
        conversation.id()
    };

    let repo = DuckdbConversationRepository::new(&db_path).expect("reopen");
    let found = repo
        .find_conversation(id)
        .await
        .expect("find")
        .expect("conversation exists");
    assert_eq!(found.title(), "Borrow checker notes");
    assert_eq!(found.role(), Role::Coding);
    assert_eq!(found.tier(), Tier::Fast);
    assert_eq!(found.model_tag(), "llama3.2:3b");
    assert_eq!(found.model_digest(), "c".repeat(64));

    let messages = repo.messages(id).await.expect("messages");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content(), "why?");
    assert_eq!(messages[0].sender(), Sender::User);
}

#[tokio::test]
async fn duckdb_conversation_default_title_and_missing_lookup() {
    let repo = DuckdbConversationRepository::in_memory().expect("duckdb init");

    let conversation = repo
        .create_conversation(&new_conversation(Some("   ")))
        .await
        .expect("create");
    assert_eq!(conversation.title(), "coding-fast");

    assert!(repo.find_conversation(999).await.expect("find").is_none());
}

#[tokio::test]
async fn duckdb_conversation_list_is_newest_first_and_filters_titles() {
    let repo = Arc::new(DuckdbConversationRepository::in_memory().expect("duckdb init"));
    for title in ["Alpha plan", "beta", "ALPHA review"] {
        repo.create_conversation(&new_conversation(Some(title)))
            .await
            .expect("create");
    }

    let all = repo.list_conversations(10, 0, None).await.expect("list");
    let titles: Vec<_> = all.iter().map(|c| c.title().to_string()).collect();
    assert_eq!(titles, vec!["ALPHA review", "beta", "Alpha plan"]);

    let alpha = repo
        .list_conversations(10, 0, Some("alpha"))
        .await
        .expect("filtered");
    assert_eq!(alpha.len(), 2);

    let page = repo.list_conversations(1, 1, None).await.expect("page");
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].title(), "beta");
}

#[tokio::test]
async fn duckdb_conversation_rename_and_message_update() {
    let repo = DuckdbConversationRepository::in_memory().expect("duckdb init");
    let conversation = repo
        .create_conversation(&new_conversation(None))
        .await
        .expect("create");

    assert!(repo
        .rename_conversation(conversation.id(), "Renamed")
        .await
        .expect("rename"));
    assert!(!repo.rename_conversation(42, "x").await.expect("rename missing"));

    let message_id = repo
        .append_message(conversation.id(), Sender::Assistant, "", None)
        .await
        .expect("placeholder");
    repo.update_message_content(message_id, "Hello!")
        .await
        .expect("update");
    assert!(repo.update_message_content(message_id + 100, "x").await.is_err());

    let found = repo
        .find_conversation(conversation.id())
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(found.title(), "Renamed");

    let messages = repo.messages(conversation.id()).await.expect("messages");
    assert_eq!(messages[0].content(), "Hello!");
    assert_eq!(messages[0].sender(), Sender::Assistant);
    repo.health().await.expect("healthy");
}
