use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use duckdb::{params, Connection, Row};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::ConversationRepository;
use crate::domain::{
    utc_timestamp, Conversation, DomainError, Message, NewConversation, Role, Sender, Tier,
};

const CONVERSATION_COLUMNS: &str =
    "id, created_utc, title, role, tier, model_tag, model_digest";
const MESSAGE_COLUMNS: &str = "id, conversation_id, created_utc, sender, content, meta_json";

/// Conversation row as stored; role and tier are validated after reading.
struct ConversationRow {
    id: i64,
    created_utc: String,
    title: String,
    role: String,
    tier: String,
    model_tag: String,
    model_digest: String,
}

impl ConversationRow {
    fn read(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created_utc: row.get(1)?,
            title: row.get(2)?,
            role: row.get(3)?,
            tier: row.get(4)?,
            model_tag: row.get(5)?,
            model_digest: row.get(6)?,
        })
    }

    fn into_conversation(self) -> Result<Conversation, DomainError> {
        let role = Role::parse(&self.role).ok_or_else(|| {
            DomainError::storage(format!("conversation {} has unknown role '{}'", self.id, self.role))
        })?;
        let tier = Tier::parse(&self.tier).ok_or_else(|| {
            DomainError::storage(format!("conversation {} has unknown tier '{}'", self.id, self.tier))
        })?;
        Ok(Conversation::reconstitute(
            self.id,
            self.created_utc,
            self.title,
            role,
            tier,
            self.model_tag,
            self.model_digest,
        ))
    }
}

fn read_message(row: &Row<'_>) -> duckdb::Result<Message> {
    let sender: String = row.get(3)?;
    Ok(Message::reconstitute(
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        Sender::from_str(&sender),
        row.get(4)?,
        row.get(5)?,
    ))
}

pub struct DuckdbConversationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DuckdbConversationRepository {
    pub fn new(db_path: &Path) -> Result<Self, DomainError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DomainError::storage(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| DomainError::storage(format!("Failed to open DuckDB database: {}", e)))?;
        Self::initialize_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self, DomainError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            DomainError::storage(format!("Failed to open DuckDB in-memory DB: {}", e))
        })?;
        Self::initialize_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), DomainError> {
        conn.execute_batch(
            r#"
            CREATE SEQUENCE IF NOT EXISTS conversations_id_seq START 1;
            CREATE TABLE IF NOT EXISTS conversations (
                id BIGINT PRIMARY KEY DEFAULT nextval('conversations_id_seq'),
                created_utc TEXT NOT NULL,
                title TEXT NOT NULL,
                role TEXT NOT NULL,
                tier TEXT NOT NULL,
                model_tag TEXT NOT NULL,
                model_digest TEXT NOT NULL
            );

            CREATE SEQUENCE IF NOT EXISTS messages_id_seq START 1;
            CREATE TABLE IF NOT EXISTS messages (
                id BIGINT PRIMARY KEY DEFAULT nextval('messages_id_seq'),
                conversation_id BIGINT NOT NULL,
                created_utc TEXT NOT NULL,
                sender TEXT NOT NULL,
                content TEXT NOT NULL,
                meta_json TEXT
            );
            "#,
        )
        .map_err(|e| DomainError::storage(format!("Failed to initialize schema: {}", e)))?;

        debug!("DuckDB conversation schema initialized");
        Ok(())
    }
}

#[async_trait]
impl ConversationRepository for DuckdbConversationRepository {
    async fn create_conversation(&self, new: &NewConversation) -> Result<Conversation, DomainError> {
        let conn = self.conn.lock().await;

        let id: i64 = conn
            .query_row(
                r#"
                INSERT INTO conversations (created_utc, title, role, tier, model_tag, model_digest)
                VALUES (?, ?, ?, ?, ?, ?)
                RETURNING id
                "#,
                params![
                    new.created_utc,
                    new.title,
                    new.slot.role.as_str(),
                    new.slot.tier.as_str(),
                    new.model.tag(),
                    new.model.digest().as_str(),
                ],
                |row| row.get(0),
            )
            .map_err(|e| DomainError::storage(format!("Failed to insert conversation: {}", e)))?;

        Ok(Conversation::reconstitute(
            id,
            new.created_utc.clone(),
            new.title.clone(),
            new.slot.role,
            new.slot.tier,
            new.model.tag().to_string(),
            new.model.digest().as_str().to_string(),
        ))
    }

    async fn find_conversation(&self, id: i64) -> Result<Option<Conversation>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM conversations WHERE id = ?",
                CONVERSATION_COLUMNS
            ))
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        match stmt.query_row(params![id], ConversationRow::read) {
            Ok(row) => Ok(Some(row.into_conversation()?)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DomainError::storage(format!(
                "Failed to query conversation: {}",
                e
            ))),
        }
    }

    async fn list_conversations(
        &self,
        limit: usize,
        offset: usize,
        q: Option<&str>,
    ) -> Result<Vec<Conversation>, DomainError> {
        let conn = self.conn.lock().await;

        let rows: Vec<ConversationRow> = match q {
            Some(q) => {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {} FROM conversations WHERE contains(lower(title), lower(?)) ORDER BY id DESC LIMIT ? OFFSET ?",
                        CONVERSATION_COLUMNS
                    ))
                    .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;
                let mapped = stmt
                    .query_map(params![q, limit as i64, offset as i64], ConversationRow::read)
                    .map_err(|e| DomainError::storage(format!("Failed to query conversations: {}", e)))?;
                mapped
                    .collect::<duckdb::Result<Vec<_>>>()
                    .map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?
            }
            None => {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {} FROM conversations ORDER BY id DESC LIMIT ? OFFSET ?",
                        CONVERSATION_COLUMNS
                    ))
                    .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;
                let mapped = stmt
                    .query_map(params![limit as i64, offset as i64], ConversationRow::read)
                    .map_err(|e| DomainError::storage(format!("Failed to query conversations: {}", e)))?;
                mapped
                    .collect::<duckdb::Result<Vec<_>>>()
                    .map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?
            }
        };

        rows.into_iter().map(ConversationRow::into_conversation).collect()
    }

    async fn rename_conversation(&self, id: i64, title: &str) -> Result<bool, DomainError> {
        let conn = self.conn.lock().await;
        let updated = conn
            .execute(
                "UPDATE conversations SET title = ? WHERE id = ?",
                params![title, id],
            )
            .map_err(|e| DomainError::storage(format!("Failed to rename conversation: {}", e)))?;
        Ok(updated > 0)
    }

    async fn append_message(
        &self,
        conversation_id: i64,
        sender: Sender,
        content: &str,
        meta_json: Option<&str>,
    ) -> Result<i64, DomainError> {
        let conn = self.conn.lock().await;
        conn.query_row(
            r#"
            INSERT INTO messages (conversation_id, created_utc, sender, content, meta_json)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
            params![conversation_id, utc_timestamp(), sender.as_str(), content, meta_json],
            |row| row.get(0),
        )
        .map_err(|e| DomainError::storage(format!("Failed to insert message: {}", e)))
    }

    async fn messages(&self, conversation_id: i64) -> Result<Vec<Message>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM messages WHERE conversation_id = ? ORDER BY id",
                MESSAGE_COLUMNS
            ))
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        let rows = stmt
            .query_map(params![conversation_id], read_message)
            .map_err(|e| DomainError::storage(format!("Failed to query messages: {}", e)))?;

        let mut messages = Vec::new();
        for row in rows {
            messages
                .push(row.map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?);
        }
        Ok(messages)
    }

    async fn update_message_content(&self, message_id: i64, content: &str) -> Result<(), DomainError> {
        let conn = self.conn.lock().await;
        let updated = conn
            .execute(
                "UPDATE messages SET content = ? WHERE id = ?",
                params![content, message_id],
            )
            .map_err(|e| DomainError::storage(format!("Failed to update message: {}", e)))?;

        if updated == 0 {
            return Err(DomainError::storage(format!(
                "message {} does not exist",
                message_id
            )));
        }
        Ok(())
    }

    async fn health(&self) -> Result<(), DomainError> {
        let conn = self.conn.lock().await;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i32>(0))
            .map(|_| ())
            .map_err(|e| DomainError::storage(format!("Health check failed: {}", e)))
    }
}
