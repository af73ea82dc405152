use anyhow::Result;

use crate::domain::StatusSnapshot;

use super::super::Container;

pub struct StatusController<'a> {
    container: &'a Container,
}

impl<'a> StatusController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn status(&self, json: bool) -> Result<String> {
        let snapshot = self.container.status_use_case().execute().await;
        if json {
            return Ok(serde_json::to_string_pretty(&snapshot)?);
        }
        Ok(self.format_status(&snapshot))
    }

    fn format_status(&self, snapshot: &StatusSnapshot) -> String {
        let backend = if snapshot.backend.reachable {
            format!("reachable (version {})", snapshot.backend.version)
        } else {
            "unreachable".to_string()
        };
        let db = match &snapshot.db.error {
            Some(error) => format!("unhealthy ({})", error),
            None if snapshot.db.healthy => "healthy".to_string(),
            None => "unhealthy".to_string(),
        };

        let mut output = format!(
            "PinChat Status\n==============\nCore:     {} ({})\nBackend:  {} at {}\nDatabase: {} at {}\n",
            snapshot.core.version,
            snapshot.core.base_url,
            backend,
            snapshot.backend.base_url,
            db,
            snapshot.db.path,
        );

        output.push_str(&format!(
            "Pins:     match={} digests={} ({})\n",
            tri_state(snapshot.pins.pins_match),
            tri_state(snapshot.pins.model_digests_match),
            snapshot.pins.pinned_path,
        ));
        if let Some(detail) = &snapshot.pins.detail {
            output.push_str(&format!("          {}\n", detail));
        }

        output.push_str(&format!(
            "Files:    settings={} pinned={}",
            present(snapshot.files.settings_exists),
            present(snapshot.files.pinned_exists),
        ));
        output
    }
}

fn tri_state(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "yes",
        Some(false) => "no",
        None => "unknown",
    }
}

fn present(exists: bool) -> &'static str {
    if exists {
        "present"
    } else {
        "missing"
    }
}
