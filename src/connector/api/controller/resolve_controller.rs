use anyhow::Result;

use super::super::Container;

pub struct ResolveController<'a> {
    container: &'a Container,
}

impl<'a> ResolveController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Shows which pinned model a new conversation for (role, tier) would use.
    pub async fn resolve(&self, role: String, tier: String) -> Result<String> {
        let (slot, resolution) = self
            .container
            .create_conversation_use_case()
            .resolve(&role, &tier)?;

        let mut output = format!(
            "{} -> {}\n  digest: {}",
            slot,
            resolution.model.tag(),
            resolution.model.digest()
        );
        if let Some(annotation) = &resolution.annotation {
            output.push_str(&format!("\n  note:   {}", annotation));
        }
        Ok(output)
    }
}
