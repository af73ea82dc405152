use serde::Serialize;

/// Version reported in status snapshots and exports.
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const STATUS_SCHEMA_VERSION: u32 = 1;

/// Point-in-time health report.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub schema_version: u32,
    pub captured_utc: String,
    pub core: CoreStatus,
    pub backend: BackendStatus,
    pub pins: PinsStatus,
    pub db: DbStatus,
    pub files: FilesStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoreStatus {
    pub reachable: bool,
    pub version: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackendStatus {
    pub reachable: bool,
    pub version: String,
    pub base_url: String,
}

/// `None` means "unknown": the inputs needed to decide were unavailable.
#[derive(Debug, Clone, Serialize)]
pub struct PinsStatus {
    pub pinned_path: String,
    pub pins_match: Option<bool>,
    pub model_digests_match: Option<bool>,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DbStatus {
    pub path: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilesStatus {
    pub settings_exists: bool,
    pub pinned_exists: bool,
}

/// Join non-empty detail fragments with `"; "`.
pub fn append_detail(existing: Option<String>, add: impl AsRef<str>) -> Option<String> {
    let add = add.as_ref().trim();
    if add.is_empty() {
        return existing;
    }
    match existing.as_deref().map(str::trim) {
        Some(current) if !current.is_empty() => Some(format!("{current}; {add}")),
        _ => Some(add.to_string()),
    }
}
