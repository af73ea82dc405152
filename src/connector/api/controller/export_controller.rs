use anyhow::Result;

use super::super::Container;

pub struct ExportController<'a> {
    container: &'a Container,
}

impl<'a> ExportController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn export(&self, id: i64) -> Result<String> {
        let receipt = self.container.export_use_case().execute(id).await?;
        Ok(format!(
            "Exported conversation {} to {}\n  {}\n  {}",
            id, receipt.dir, receipt.md, receipt.json
        ))
    }
}
