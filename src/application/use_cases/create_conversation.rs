use std::sync::Arc;

use tracing::info;

use crate::application::ConversationRepository;
use crate::domain::{
    resolve, short_digest, Conversation, DomainError, ManifestState, NewConversation, PinSlot,
    Resolution, ResolutionPolicy,
};

/// Resolves a (role, tier) intent to a pinned model and records a conversation
/// frozen to that model.
pub struct CreateConversationUseCase {
    repository: Arc<dyn ConversationRepository>,
    manifest: ManifestState,
    policy: ResolutionPolicy,
}

impl CreateConversationUseCase {
    pub fn new(
        repository: Arc<dyn ConversationRepository>,
        manifest: ManifestState,
        policy: ResolutionPolicy,
    ) -> Self {
        Self {
            repository,
            manifest,
            policy,
        }
    }

    /// Resolution only, without creating anything.
    pub fn resolve(&self, role: &str, tier: &str) -> Result<(PinSlot, Resolution), DomainError> {
        let slot = PinSlot::parse(role, tier)?;
        let manifest = self.manifest.manifest()?;
        let resolution = resolve(slot, &self.policy, manifest)?;
        Ok((slot, resolution))
    }

    pub async fn execute(
        &self,
        role: &str,
        tier: &str,
        title: Option<&str>,
    ) -> Result<Conversation, DomainError> {
        let (slot, resolution) = self.resolve(role, tier)?;

        if let Some(annotation) = &resolution.annotation {
            info!("Resolved {} via {}", slot, annotation);
        }

        let new = NewConversation::new(slot, resolution.model, title);
        let conversation = self.repository.create_conversation(&new).await?;

        info!(
            "Created conversation {} ({}) with model {}@{}",
            conversation.id(),
            slot,
            conversation.model_tag(),
            short_digest(conversation.model_digest())
        );

        Ok(conversation)
    }
}
