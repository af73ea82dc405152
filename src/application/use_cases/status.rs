use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::application::{ConversationRepository, InferenceBackend};
use crate::domain::{
    append_detail, utc_timestamp, validate_completeness, verify, BackendStatus, CoreStatus,
    DbStatus, FilesStatus, LiveInventoryEntry, ManifestState, PinsStatus, StatusSnapshot, CORE_VERSION,
    STATUS_SCHEMA_VERSION,
};

/// Locations reported by the status snapshot.
#[derive(Debug, Clone)]
pub struct StatusSources {
    pub core_base_url: String,
    pub settings_path: PathBuf,
    pub pinned_path: PathBuf,
    pub db_path: String,
}

/// Assembles a best-effort health report. Never fails: every probe that cannot
/// answer is reported as unknown or unhealthy instead.
pub struct StatusUseCase {
    backend: Arc<dyn InferenceBackend>,
    repository: Arc<dyn ConversationRepository>,
    manifest: ManifestState,
    sources: StatusSources,
}

impl StatusUseCase {
    pub fn new(
        backend: Arc<dyn InferenceBackend>,
        repository: Arc<dyn ConversationRepository>,
        manifest: ManifestState,
        sources: StatusSources,
    ) -> Self {
        Self {
            backend,
            repository,
            manifest,
            sources,
        }
    }

    pub async fn execute(&self) -> StatusSnapshot {
        let version = self.backend.version().await;
        let inventory = match version {
            Some(_) => self.backend.inventory().await,
            None => None,
        };
        debug!(
            "Backend probe: version={:?} inventory={:?}",
            version,
            inventory.as_ref().map(Vec::len)
        );

        let pins = self.pins_status(version.as_deref(), inventory.as_deref());

        let db = match self.repository.health().await {
            Ok(()) => DbStatus {
                path: self.sources.db_path.clone(),
                healthy: true,
                error: None,
            },
            Err(err) => DbStatus {
                path: self.sources.db_path.clone(),
                healthy: false,
                error: Some(err.to_error_body().message),
            },
        };

        let files = FilesStatus {
            settings_exists: exists(&self.sources.settings_path).await,
            pinned_exists: exists(&self.sources.pinned_path).await,
        };

        StatusSnapshot {
            schema_version: STATUS_SCHEMA_VERSION,
            captured_utc: utc_timestamp(),
            core: CoreStatus {
                reachable: true,
                version: CORE_VERSION.to_string(),
                base_url: self.sources.core_base_url.clone(),
            },
            backend: BackendStatus {
                reachable: version.is_some(),
                version: version.clone().unwrap_or_else(|| "unknown".to_string()),
                base_url: self.backend.base_url().to_string(),
            },
            pins,
            db,
            files,
        }
    }

    fn pins_status(
        &self,
        live_version: Option<&str>,
        inventory: Option<&[LiveInventoryEntry]>,
    ) -> PinsStatus {
        let pinned_path = self.sources.pinned_path.display().to_string();

        let manifest = match &self.manifest {
            ManifestState::Loaded(manifest) => manifest,
            ManifestState::Unavailable(detail) => {
                return PinsStatus {
                    pinned_path,
                    pins_match: None,
                    model_digests_match: None,
                    detail: Some(detail.clone()),
                }
            }
        };

        let completeness = validate_completeness(manifest);
        let mut detail = completeness.detail;
        let mut drifted = false;

        let model_digests_match = match inventory {
            Some(inventory) => {
                let verdict = verify(manifest, inventory);
                if let Some(mismatches) = verdict.detail() {
                    detail = append_detail(detail, mismatches);
                    drifted = true;
                }
                Some(verdict.all_match)
            }
            None => {
                detail = append_detail(detail, "inventory unavailable");
                None
            }
        };

        if let (Some(pinned), Some(live)) = (manifest.backend_version(), live_version) {
            if pinned.trim() != live {
                detail = append_detail(
                    detail,
                    format!("backend version mismatch (pinned={}, live={})", pinned.trim(), live),
                );
                drifted = true;
            }
        }

        // Drift is reported against the moment the pins were recorded.
        if drifted {
            if let Some(captured) = manifest.captured_utc() {
                detail = append_detail(detail, format!("pins captured {}", captured));
            }
        }

        PinsStatus {
            pinned_path,
            pins_match: Some(completeness.complete),
            model_digests_match,
            detail,
        }
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
