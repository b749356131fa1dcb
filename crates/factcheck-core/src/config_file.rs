use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Config, RequestMethod};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub service: Option<ServiceConfig>,
    pub storage: Option<StorageConfig>,
    pub display: Option<DisplayConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub endpoint: Option<String>,
    /// "get" or "post".
    pub method: Option<String>,
    pub result_limit: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub use_dummy_api: Option<bool>,
    pub dummy_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub state_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub theme: Option<String>,
}

/// Platform config directory path: `<config_dir>/factcheck/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("factcheck").join("config.toml"))
}

/// Default location of the persistent state: `<data_dir>/factcheck/state.db`.
pub fn default_state_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("factcheck").join("state.db"))
}

/// Load config by cascading CWD `.factcheck.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".factcheck.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let base_service = base.service.unwrap_or_default();
    let overlay_service = overlay.service.unwrap_or_default();
    let base_storage = base.storage.unwrap_or_default();
    let overlay_storage = overlay.storage.unwrap_or_default();
    let base_display = base.display.unwrap_or_default();
    let overlay_display = overlay.display.unwrap_or_default();

    ConfigFile {
        service: Some(ServiceConfig {
            endpoint: overlay_service.endpoint.or(base_service.endpoint),
            method: overlay_service.method.or(base_service.method),
            result_limit: overlay_service.result_limit.or(base_service.result_limit),
            timeout_secs: overlay_service.timeout_secs.or(base_service.timeout_secs),
            use_dummy_api: overlay_service.use_dummy_api.or(base_service.use_dummy_api),
            dummy_delay_ms: overlay_service.dummy_delay_ms.or(base_service.dummy_delay_ms),
        }),
        storage: Some(StorageConfig {
            state_path: overlay_storage.state_path.or(base_storage.state_path),
        }),
        display: Some(DisplayConfig {
            theme: overlay_display.theme.or(base_display.theme),
        }),
    }
}

impl ConfigFile {
    /// Apply file values over [`Config::default`].
    ///
    /// An unknown `method` is reported and the default kept. The state path
    /// falls back to [`default_state_path`].
    pub fn resolve(&self) -> Config {
        let mut config = Config::default();
        if let Some(service) = &self.service {
            if let Some(endpoint) = &service.endpoint {
                config.endpoint = endpoint.clone();
            }
            if let Some(method) = &service.method {
                match method.parse::<RequestMethod>() {
                    Ok(m) => config.method = m,
                    Err(e) => tracing::warn!(error = %e, "ignoring config method"),
                }
            }
            if let Some(limit) = service.result_limit {
                config.result_limit = limit.max(1);
            }
            if let Some(timeout) = service.timeout_secs {
                config.timeout_secs = timeout;
            }
            if let Some(dummy) = service.use_dummy_api {
                config.use_dummy_api = dummy;
            }
            if let Some(delay) = service.dummy_delay_ms {
                config.dummy_delay_ms = delay;
            }
        }
        config.state_path = self
            .storage
            .as_ref()
            .and_then(|s| s.state_path.as_ref())
            .map(PathBuf::from)
            .or_else(default_state_path);
        config
    }

    pub fn theme(&self) -> Option<&str> {
        self.display.as_ref().and_then(|d| d.theme.as_deref())
    }
}

/// Save the current config to the platform config directory.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, String> {
    let path = config_path().ok_or_else(|| "Could not determine config directory".to_string())?;
    save_to_path(config, &path)?;
    Ok(path)
}

pub fn save_to_path(config: &ConfigFile, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let content =
        toml::to_string_pretty(config).map_err(|e| format!("Failed to serialize config: {}", e))?;
    std::fs::write(path, content).map_err(|e| format!("Failed to write config: {}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_round_trip_toml() {
        let config = ConfigFile {
            service: Some(ServiceConfig {
                endpoint: Some("http://example.org/api/search".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: ConfigFile = toml::from_str(&toml_str).unwrap();
        assert_eq!(
            parsed.service.unwrap().endpoint.unwrap(),
            "http://example.org/api/search"
        );
    }

    #[test]
    fn partial_file_deserializes() {
        let toml_str = "[service]\nmethod = \"get\"\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        assert!(parsed.storage.is_none());
        let config = parsed.resolve();
        assert_eq!(config.method, RequestMethod::Get);
        assert_eq!(config.result_limit, crate::DEFAULT_RESULT_LIMIT);
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            service: Some(ServiceConfig {
                endpoint: Some("http://base".to_string()),
                result_limit: Some(3),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            service: Some(ServiceConfig {
                endpoint: Some("http://overlay".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay).service.unwrap();
        assert_eq!(merged.endpoint.unwrap(), "http://overlay");
        assert_eq!(merged.result_limit, Some(3));
    }

    #[test]
    fn merge_base_preserved_when_overlay_absent() {
        let base = ConfigFile {
            storage: Some(StorageConfig {
                state_path: Some("/base/state.db".to_string()),
            }),
            ..Default::default()
        };
        let merged = merge(base, ConfigFile::default());
        assert_eq!(
            merged.storage.unwrap().state_path.unwrap(),
            "/base/state.db"
        );
    }

    #[test]
    fn resolve_keeps_default_on_bad_method() {
        let file = ConfigFile {
            service: Some(ServiceConfig {
                method: Some("put".to_string()),
                use_dummy_api: Some(false),
                ..Default::default()
            }),
            storage: Some(StorageConfig {
                state_path: Some("/tmp/fc.db".to_string()),
            }),
            ..Default::default()
        };
        let config = file.resolve();
        assert_eq!(config.method, RequestMethod::Post);
        assert!(!config.use_dummy_api);
        assert_eq!(config.state_path, Some(PathBuf::from("/tmp/fc.db")));
    }

    #[test]
    fn save_then_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");
        let file = ConfigFile {
            display: Some(DisplayConfig {
                theme: Some("modern".to_string()),
            }),
            ..Default::default()
        };
        save_to_path(&file, &path).unwrap();
        let loaded = load_from_path(&path).unwrap();
        assert_eq!(loaded.theme(), Some("modern"));
    }
}
