use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use super::ConfigError;
use crate::domain::{PinMode, PinSlot, ResolutionPolicy};

pub const SETTINGS_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_BIND_URL: &str = "http://127.0.0.1:8484";
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2000;
const MAX_PROBE_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    #[serde(default)]
    schema_version: Option<u32>,
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    backend: BackendSection,
    #[serde(default)]
    pins: PinsSection,
    #[serde(default)]
    storage: StorageSection,
    #[serde(default)]
    exports: ExportsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ServerSection {
    bind_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct BackendSection {
    base_url: Option<String>,
    probe_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PinsSection {
    mode: Option<String>,
    fallback_role: Option<String>,
    fallback_tier: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct StorageSection {
    db_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExportsSection {
    root: Option<PathBuf>,
    #[serde(default)]
    allow_write_under: Vec<PathBuf>,
    block_symlinks: Option<bool>,
}

/// Validated process settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_url: String,
    pub backend_url: String,
    pub probe_timeout: Duration,
    pub policy: ResolutionPolicy,
    /// `None` means the data-dir default.
    pub db_path: Option<PathBuf>,
    /// `None` means the data-dir default.
    pub exports_root: Option<PathBuf>,
    pub allow_write_under: Vec<PathBuf>,
    pub block_symlinks: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_url: DEFAULT_BIND_URL.to_string(),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            probe_timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
            policy: ResolutionPolicy::default(),
            db_path: None,
            exports_root: None,
            allow_write_under: Vec::new(),
            block_symlinks: true,
        }
    }
}

impl Settings {
    /// `host:port` part of the bind URL, for the TCP listener.
    pub fn bind_addr(&self) -> Result<String, ConfigError> {
        let url = reqwest::Url::parse(&self.bind_url).map_err(|e| ConfigError::Invalid {
            path: PathBuf::from("settings"),
            message: format!("server.bind_url: {}", e),
        })?;
        let host = url.host_str().unwrap_or("127.0.0.1");
        let port = url.port_or_known_default().unwrap_or(80);
        if host.contains(':') {
            Ok(format!("[{}]:{}", host.trim_matches(|c| c == '[' || c == ']'), port))
        } else {
            Ok(format!("{}:{}", host, port))
        }
    }
}

/// Loads settings from `path`. A missing file yields [`Settings::default`].
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            let settings = parse_settings(path, &text)?;
            info!("Loaded settings from {}", path.display());
            Ok(settings)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No settings file at {}, using defaults", path.display());
            Ok(Settings::default())
        }
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub fn parse_settings(path: &Path, text: &str) -> Result<Settings, ConfigError> {
    let file: SettingsFile = toml::from_str(text).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if let Some(version) = file.schema_version {
        if version != SETTINGS_SCHEMA_VERSION {
            return Err(ConfigError::invalid(
                path,
                format!("schema_version must be {} (got {})", SETTINGS_SCHEMA_VERSION, version),
            ));
        }
    }

    let defaults = Settings::default();

    let bind_url = match file.server.bind_url {
        Some(url) => loopback_http_url(path, "server.bind_url", &url)?,
        None => defaults.bind_url,
    };
    let backend_url = match file.backend.base_url {
        Some(url) => loopback_http_url(path, "backend.base_url", &url)?,
        None => defaults.backend_url,
    };

    let probe_timeout = match file.backend.probe_timeout_ms {
        Some(ms) if (1..=MAX_PROBE_TIMEOUT_MS).contains(&ms) => Duration::from_millis(ms),
        Some(ms) => {
            return Err(ConfigError::invalid(
                path,
                format!(
                    "backend.probe_timeout_ms must be between 1 and {} (got {})",
                    MAX_PROBE_TIMEOUT_MS, ms
                ),
            ))
        }
        None => defaults.probe_timeout,
    };

    let policy = parse_policy(path, &file.pins)?;

    let exports_root = file
        .exports
        .root
        .map(|root| absolute(path, "exports.root", root))
        .transpose()?;
    let allow_write_under = file
        .exports
        .allow_write_under
        .into_iter()
        .map(|root| absolute(path, "exports.allow_write_under", root))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Settings {
        bind_url,
        backend_url,
        probe_timeout,
        policy,
        db_path: file.storage.db_path,
        exports_root,
        allow_write_under,
        block_symlinks: file.exports.block_symlinks.unwrap_or(defaults.block_symlinks),
    })
}

fn parse_policy(path: &Path, pins: &PinsSection) -> Result<ResolutionPolicy, ConfigError> {
    let mode = match pins.mode.as_deref().map(|m| m.trim().to_ascii_lowercase()) {
        None => PinMode::Strict,
        Some(mode) if mode == "strict" => PinMode::Strict,
        Some(mode) if mode == "fallback" => PinMode::Fallback,
        Some(other) => {
            return Err(ConfigError::invalid(
                path,
                format!("pins.mode must be 'strict' or 'fallback' (got '{}')", other),
            ))
        }
    };

    let default_fallback = ResolutionPolicy::default().fallback();
    let fallback = PinSlot::parse(
        pins.fallback_role
            .as_deref()
            .unwrap_or(default_fallback.role.as_str()),
        pins.fallback_tier
            .as_deref()
            .unwrap_or(default_fallback.tier.as_str()),
    )
    .map_err(|e| ConfigError::invalid(path, format!("pins fallback: {}", e)))?;

    Ok(ResolutionPolicy::new(mode, fallback))
}

fn loopback_http_url(path: &Path, field: &str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let url = reqwest::Url::parse(trimmed)
        .map_err(|e| ConfigError::invalid(path, format!("{}: invalid URL '{}': {}", field, trimmed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::invalid(
            path,
            format!("{}: scheme must be http or https (got '{}')", field, url.scheme()),
        ));
    }

    let host = url.host_str().unwrap_or_default();
    let loopback = host.eq_ignore_ascii_case("localhost")
        || host
            .trim_matches(|c| c == '[' || c == ']')
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false);
    if !loopback {
        return Err(ConfigError::invalid(
            path,
            format!("{}: host must be loopback (got '{}')", field, host),
        ));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

fn absolute(path: &Path, field: &str, candidate: PathBuf) -> Result<PathBuf, ConfigError> {
    if candidate.is_absolute() {
        Ok(candidate)
    } else {
        Err(ConfigError::invalid(
            path,
            format!("{}: path must be absolute (got '{}')", field, candidate.display()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, Tier};

    fn parse(text: &str) -> Result<Settings, ConfigError> {
        parse_settings(Path::new("settings.toml"), text)
    }

    #[test]
    fn empty_file_yields_defaults() {
        let settings = parse("").unwrap();
        assert_eq!(settings.bind_url, DEFAULT_BIND_URL);
        assert_eq!(settings.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(settings.policy.mode(), PinMode::Strict);
        assert!(settings.block_symlinks);
    }

    #[test]
    fn parses_every_section() {
        let settings = parse(
            r#"
            schema_version = 1

            [server]
            bind_url = "http://localhost:9000/"

            [backend]
            base_url = "http://127.0.0.1:11500"
            probe_timeout_ms = 500

            [pins]
            mode = "Fallback"
            fallback_role = "coding"
            fallback_tier = "thinking"

            [storage]
            db_path = "/var/lib/pinchat/db.duckdb"

            [exports]
            root = "/srv/exports"
            allow_write_under = ["/srv/exports", "/tmp/exports"]
            block_symlinks = false
            "#,
        )
        .unwrap();

        assert_eq!(settings.bind_url, "http://localhost:9000");
        assert_eq!(settings.bind_addr().unwrap(), "localhost:9000");
        assert_eq!(settings.probe_timeout, Duration::from_millis(500));
        assert_eq!(settings.policy.mode(), PinMode::Fallback);
        assert_eq!(
            settings.policy.fallback(),
            PinSlot::new(Role::Coding, Tier::Thinking)
        );
        assert_eq!(settings.allow_write_under.len(), 2);
        assert!(!settings.block_symlinks);
    }

    #[test]
    fn rejects_non_loopback_and_non_http_urls() {
        let err = parse("[backend]\nbase_url = \"http://10.0.0.5:11434\"\n").unwrap_err();
        assert!(err.to_string().contains("host must be loopback"));

        let err = parse("[server]\nbind_url = \"ftp://127.0.0.1\"\n").unwrap_err();
        assert!(err.to_string().contains("scheme must be http"));
    }

    #[test]
    fn rejects_invalid_policy_and_paths() {
        assert!(parse("[pins]\nmode = \"loose\"\n").is_err());
        assert!(parse("[pins]\nfallback_role = \"writer\"\n").is_err());
        assert!(parse("[exports]\nroot = \"relative/dir\"\n").is_err());
        assert!(parse("schema_version = 3\n").is_err());
        assert!(parse("[server]\nport = 1\n").is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings(&dir.path().join("settings.toml")).unwrap();
        assert_eq!(settings.bind_url, DEFAULT_BIND_URL);
    }
}
