use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use super::WriteBoundary;
use crate::application::ConversationExporter;
use crate::domain::{ConversationExport, DomainError, ExportReceipt};

/// Writes `<root>/<YYYY-MM-DD>/<id>.<slug>.{json,md}`.
pub struct FileExporter {
    root: PathBuf,
    boundary: WriteBoundary,
}

impl FileExporter {
    pub fn new(root: PathBuf, boundary: WriteBoundary) -> Self {
        Self { root, boundary }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

#[async_trait]
impl ConversationExporter for FileExporter {
    async fn write(&self, export: &ConversationExport, slug: &str) -> Result<ExportReceipt, DomainError> {
        let date = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let dir = self.root.join(date);
        self.boundary.check(&dir)?;

        tokio::fs::create_dir_all(&dir).await?;

        let stem = format!("{}.{}", export.conversation.id, slug);
        let json_path = dir.join(format!("{}.json", stem));
        let md_path = dir.join(format!("{}.md", stem));

        let json = serde_json::to_string_pretty(export)
            .map_err(|e| DomainError::internal(format!("Failed to serialize export: {}", e)))?;
        tokio::fs::write(&json_path, json).await?;
        tokio::fs::write(&md_path, export.to_markdown()).await?;

        debug!("Wrote {} and {}", json_path.display(), md_path.display());

        Ok(ExportReceipt {
            ok: true,
            dir: dir.display().to_string(),
            md: md_path.display().to_string(),
            json: json_path.display().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{utc_timestamp, Conversation, Message, Role, Sender, Tier};

    fn export() -> ConversationExport {
        let conversation = Conversation::reconstitute(
            7,
            "2025-01-01T00:00:00Z".into(),
            "Plan: Q3".into(),
            Role::General,
            Tier::Fast,
            "m:1".into(),
            "a".repeat(64),
        );
        let messages = vec![Message::reconstitute(
            1,
            7,
            "2025-01-01T00:00:01Z".into(),
            Sender::User,
            "hi".into(),
            None,
        )];
        ConversationExport::new(&conversation, messages, utc_timestamp(), "0.1.0")
    }

    #[tokio::test]
    async fn writes_json_and_markdown_under_dated_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("exports");
        let exporter = FileExporter::new(root.clone(), WriteBoundary::new(vec![root.clone()], true));

        let receipt = exporter.write(&export(), "plan-q3").await.unwrap();
        assert!(receipt.ok);
        assert!(receipt.json.ends_with("7.plan-q3.json"));
        assert!(receipt.md.ends_with("7.plan-q3.md"));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&receipt.json).unwrap()).unwrap();
        assert_eq!(json["schema_version"], 1);
        assert_eq!(json["model"]["tag"], "m:1");
        assert_eq!(json["messages"][0]["content"], "hi");

        let md = std::fs::read_to_string(&receipt.md).unwrap();
        assert!(md.starts_with("# Conversation 7: Plan: Q3"));
    }

    #[tokio::test]
    async fn refuses_roots_outside_the_allowlist() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = FileExporter::new(
            dir.path().join("exports"),
            WriteBoundary::new(vec![dir.path().join("other")], false),
        );

        let err = exporter.write(&export(), "plan-q3").await.unwrap_err();
        assert_eq!(err.code(), "BOUNDARY_DENY");
        assert!(!dir.path().join("exports").exists());
    }
}
