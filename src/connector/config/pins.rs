use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use super::ConfigError;
use crate::domain::{Digest, ManifestState, PinEntry, PinManifest, PinSlot, Role, Tier};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PinnedFile {
    schema_version: u32,
    #[serde(default)]
    captured_utc: Option<String>,
    #[serde(default)]
    backend: Option<BackendSection>,
    #[serde(default)]
    models: BTreeMap<String, BTreeMap<String, ModelSection>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BackendSection {
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModelSection {
    tag: String,
    #[serde(default)]
    digest: Option<String>,
    #[serde(default)]
    required: bool,
}

/// Loads the pin manifest at `path`.
///
/// A missing file is not an error: the result is [`ManifestState::Unavailable`]
/// so the process can still report status.
pub fn load_pin_manifest(path: &Path) -> Result<ManifestState, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Pin manifest not found at {}", path.display());
            return Ok(ManifestState::Unavailable(format!(
                "pin manifest not found at {}",
                path.display()
            )));
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let manifest = parse_pin_manifest(path, &text)?;
    info!(
        "Loaded pin manifest from {} ({} entries)",
        path.display(),
        manifest.len()
    );
    Ok(ManifestState::Loaded(Arc::new(manifest)))
}

pub fn parse_pin_manifest(path: &Path, text: &str) -> Result<PinManifest, ConfigError> {
    let file: PinnedFile = toml::from_str(text).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if file.schema_version != PinManifest::SCHEMA_VERSION {
        return Err(ConfigError::invalid(
            path,
            format!(
                "schema_version must be {} (got {})",
                PinManifest::SCHEMA_VERSION,
                file.schema_version
            ),
        ));
    }

    let mut entries = Vec::new();
    for (role_key, tiers) in &file.models {
        let role = Role::parse(role_key)
            .ok_or_else(|| ConfigError::invalid(path, format!("unknown role '{}'", role_key)))?;

        for (tier_key, model) in tiers {
            let tier = Tier::parse(tier_key).ok_or_else(|| {
                ConfigError::invalid(path, format!("unknown tier '{}' under role '{}'", tier_key, role_key))
            })?;
            let slot = PinSlot::new(role, tier);

            let tag = model.tag.trim();
            if tag.is_empty() {
                return Err(ConfigError::invalid(path, format!("{}: tag must not be blank", slot)));
            }

            let digest = match model.digest.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(raw) => Some(Digest::normalize(raw).ok_or_else(|| {
                    ConfigError::invalid(
                        path,
                        format!("{}: digest '{}' is not a 64-character hex sha256", slot, raw),
                    )
                })?),
            };

            entries.push(PinEntry::new(slot, tag, digest, model.required));
        }
    }

    let captured_utc = file.captured_utc.filter(|s| !s.trim().is_empty());
    let backend_version = file
        .backend
        .and_then(|b| b.version)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    PinManifest::new(captured_utc, backend_version, entries)
        .map_err(|e| ConfigError::invalid(path, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<PinManifest, ConfigError> {
        parse_pin_manifest(Path::new("pinned.toml"), text)
    }

    #[test]
    fn parses_and_normalizes_entries() {
        let manifest = parse(&format!(
            r#"
            schema_version = 1
            captured_utc = "2025-01-01T00:00:00Z"

            [backend]
            version = " 0.5.7 "

            [models.general.fast]
            tag = "llama3.2:3b"
            digest = "sha256:{}"
            required = true

            [models.Coding.THINKING]
            tag = "qwen:14b"
            "#,
            "A".repeat(64)
        ))
        .unwrap();

        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.backend_version(), Some("0.5.7"));

        let general = manifest.get(PinSlot::new(Role::General, Tier::Fast)).unwrap();
        assert_eq!(general.digest().unwrap().as_str(), "a".repeat(64));
        assert!(general.required());

        let coding = manifest.get(PinSlot::new(Role::Coding, Tier::Thinking)).unwrap();
        assert!(coding.digest().is_none());
        assert!(!coding.required());
    }

    #[test]
    fn rejects_wrong_schema_version() {
        let err = parse("schema_version = 2").unwrap_err();
        assert!(err.to_string().contains("schema_version must be 1"));
    }

    #[test]
    fn rejects_unknown_role_and_tier() {
        let err = parse("schema_version = 1\n[models.writer.fast]\ntag = \"x\"\n").unwrap_err();
        assert!(err.to_string().contains("unknown role 'writer'"));

        let err = parse("schema_version = 1\n[models.general.slow]\ntag = \"x\"\n").unwrap_err();
        assert!(err.to_string().contains("unknown tier 'slow'"));
    }

    #[test]
    fn rejects_bad_digest_and_blank_tag() {
        let err = parse("schema_version = 1\n[models.general.fast]\ntag = \"x\"\ndigest = \"abc\"\n")
            .unwrap_err();
        assert!(err.to_string().contains("general.fast: digest 'abc'"));

        let err = parse("schema_version = 1\n[models.general.fast]\ntag = \"  \"\n").unwrap_err();
        assert!(err.to_string().contains("tag must not be blank"));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = parse("schema_version = 1\nextra = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_a_degraded_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = load_pin_manifest(&dir.path().join("pinned.toml")).unwrap();
        assert!(state.loaded().is_none());
        assert_eq!(state.manifest().unwrap_err().code(), "PIN_MISSING");
    }
}
