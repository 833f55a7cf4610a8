//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Default session settings.
    #[serde(default)]
    pub session: SessionDefaults,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default capture and sharing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDefaults {
    /// Quality tier name (`standard`, `high`, `ultra`).
    pub default_quality: String,

    /// Whether audio starts enabled.
    pub audio_enabled: bool,

    /// Display surface kind (`monitor`, `window`, `browser`).
    pub display_surface: String,

    /// Simulated latency of the placeholder join path, in milliseconds.
    pub join_latency_ms: u64,

    /// Page locator that share links are built on.
    pub share_base_url: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "streamscribe=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            default_quality: "high".to_string(),
            audio_enabled: true,
            display_surface: "monitor".to_string(),
            join_latency_ms: 1500,
            share_base_url: "http://localhost:8080/".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &std::path::Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("streamscribe").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_missing_fields() {
        let json = r#"{ "session": { "join_latency_ms": 250 } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.session.join_latency_ms, 250);
        assert_eq!(config.session.default_quality, "high");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join("streamscribe_test_config");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.session.join_latency_ms, 1500);
        assert!(config.session.audio_enabled);

        std::fs::remove_dir_all(&dir).ok();
    }
}
