use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::application::{
    ChatTurnUseCase, ConversationExporter, ConversationRepository, ConversationsUseCase,
    CreateConversationUseCase, ExportConversationUseCase, InferenceBackend, StatusSources,
    StatusUseCase,
};
use crate::connector::adapter::{
    DuckdbConversationRepository, FileExporter, InMemoryConversationRepository, OllamaBackend,
    WriteBoundary,
};
use crate::connector::config::{load_pin_manifest, load_settings, Settings};
use crate::domain::ManifestState;

pub const SETTINGS_FILE: &str = "settings.toml";
pub const PINNED_FILE: &str = "pinned.toml";
pub const DB_FILE: &str = "pinchat.duckdb";
pub const EXPORTS_DIR: &str = "exports";

/// Paths and switches gathered from the command line and environment.
///
/// Explicit paths win over `settings.toml`, which wins over the data-dir defaults.
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    pub data_dir: PathBuf,
    pub settings_path: Option<PathBuf>,
    pub pinned_path: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub exports_root: Option<PathBuf>,
    /// Keep conversations in process memory instead of DuckDB.
    pub memory_storage: bool,
}

impl ContainerConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            settings_path: None,
            pinned_path: None,
            db_path: None,
            exports_root: None,
            memory_storage: false,
        }
    }

    pub fn settings_path(&self) -> PathBuf {
        self.settings_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join(SETTINGS_FILE))
    }

    pub fn pinned_path(&self) -> PathBuf {
        self.pinned_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join(PINNED_FILE))
    }
}

pub struct Container {
    settings: Settings,
    manifest: ManifestState,
    repository: Arc<dyn ConversationRepository>,
    backend: Arc<dyn InferenceBackend>,
    exporter: Arc<dyn ConversationExporter>,
    sources: StatusSources,
}

impl Container {
    /// Loads configuration and wires every adapter. Invalid configuration is fatal.
    pub fn new(config: ContainerConfig) -> Result<Self> {
        let settings_path = config.settings_path();
        let pinned_path = config.pinned_path();

        let settings = load_settings(&settings_path)?;
        let manifest = load_pin_manifest(&pinned_path)?;

        let db_path = config
            .db_path
            .clone()
            .or_else(|| settings.db_path.clone())
            .unwrap_or_else(|| config.data_dir.join(DB_FILE));

        let (repository, db_label): (Arc<dyn ConversationRepository>, String) =
            if config.memory_storage {
                debug!("Using in-memory conversation storage");
                (
                    Arc::new(InMemoryConversationRepository::new()),
                    ":memory:".to_string(),
                )
            } else {
                let repo = DuckdbConversationRepository::new(&db_path)
                    .with_context(|| format!("opening database {}", db_path.display()))?;
                debug!("Opened conversation database at {}", db_path.display());
                (Arc::new(repo), db_path.display().to_string())
            };

        let exports_root = config
            .exports_root
            .clone()
            .or_else(|| settings.exports_root.clone())
            .unwrap_or_else(|| config.data_dir.join(EXPORTS_DIR));
        let allowed = if settings.allow_write_under.is_empty() {
            vec![exports_root.clone()]
        } else {
            settings.allow_write_under.clone()
        };
        let exporter = FileExporter::new(
            exports_root,
            WriteBoundary::new(allowed, settings.block_symlinks),
        );

        let backend = OllamaBackend::new(settings.backend_url.clone(), settings.probe_timeout);
        info!(
            "Inference backend at {} (pins: {}, mode: {})",
            settings.backend_url,
            match &manifest {
                ManifestState::Loaded(m) => match m.captured_utc() {
                    Some(captured) => format!("{} entries captured {}", m.len(), captured),
                    None => format!("{} entries", m.len()),
                },
                ManifestState::Unavailable(_) => "unavailable".to_string(),
            },
            settings.policy.mode().as_str()
        );

        let sources = StatusSources {
            core_base_url: settings.bind_url.clone(),
            settings_path,
            pinned_path,
            db_path: db_label,
        };

        Ok(Self::from_parts(
            settings,
            manifest,
            repository,
            Arc::new(backend),
            Arc::new(exporter),
            sources,
        ))
    }

    /// Assembles a container from already-built parts.
    pub fn from_parts(
        settings: Settings,
        manifest: ManifestState,
        repository: Arc<dyn ConversationRepository>,
        backend: Arc<dyn InferenceBackend>,
        exporter: Arc<dyn ConversationExporter>,
        sources: StatusSources,
    ) -> Self {
        Self {
            settings,
            manifest,
            repository,
            backend,
            exporter,
            sources,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn manifest(&self) -> &ManifestState {
        &self.manifest
    }

    pub fn status_use_case(&self) -> StatusUseCase {
        StatusUseCase::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.repository),
            self.manifest.clone(),
            self.sources.clone(),
        )
    }

    pub fn create_conversation_use_case(&self) -> CreateConversationUseCase {
        CreateConversationUseCase::new(
            Arc::clone(&self.repository),
            self.manifest.clone(),
            self.settings.policy,
        )
    }

    pub fn conversations_use_case(&self) -> ConversationsUseCase {
        ConversationsUseCase::new(Arc::clone(&self.repository))
    }

    pub fn chat_turn_use_case(&self) -> ChatTurnUseCase {
        ChatTurnUseCase::new(
            Arc::clone(&self.repository),
            Arc::clone(&self.backend),
            self.manifest.clone(),
            self.settings.policy,
        )
    }

    pub fn export_use_case(&self) -> ExportConversationUseCase {
        ExportConversationUseCase::new(Arc::clone(&self.repository), Arc::clone(&self.exporter))
    }
}
