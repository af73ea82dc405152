use std::sync::Arc;

use tracing::info;

use crate::application::{ConversationExporter, ConversationRepository};
use crate::domain::{
    slugify, utc_timestamp, ConversationExport, DomainError, ExportReceipt, CORE_VERSION,
};

pub struct ExportConversationUseCase {
    repository: Arc<dyn ConversationRepository>,
    exporter: Arc<dyn ConversationExporter>,
}

impl ExportConversationUseCase {
    pub fn new(
        repository: Arc<dyn ConversationRepository>,
        exporter: Arc<dyn ConversationExporter>,
    ) -> Self {
        Self {
            repository,
            exporter,
        }
    }

    pub async fn execute(&self, id: i64) -> Result<ExportReceipt, DomainError> {
        let conversation = self
            .repository
            .find_conversation(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Conversation {} not found", id)))?;
        let messages = self.repository.messages(id).await?;

        let export = ConversationExport::new(&conversation, messages, utc_timestamp(), CORE_VERSION);
        let receipt = self
            .exporter
            .write(&export, &slugify(conversation.title()))
            .await?;

        info!("Exported conversation {} to {}", id, receipt.dir);
        Ok(receipt)
    }
}
