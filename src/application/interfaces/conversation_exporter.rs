use async_trait::async_trait;

use crate::domain::{ConversationExport, DomainError, ExportReceipt};

/// Writes a conversation export (JSON document plus Markdown transcript).
#[async_trait]
pub trait ConversationExporter: Send + Sync {
    async fn write(&self, export: &ConversationExport, slug: &str) -> Result<ExportReceipt, DomainError>;
}
