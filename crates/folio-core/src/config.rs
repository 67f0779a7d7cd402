use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_api_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_chat_url() -> String {
    "ws://localhost:8080/chat".to_string()
}

fn default_debounce_quiet_ms() -> u64 {
    crate::app::runtime::debounce::QUIET_PERIOD.as_millis() as u64
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_chat_url")]
    pub chat_url: String,

    /// Quiet period for input debouncing, in milliseconds.
    #[serde(default = "default_debounce_quiet_ms")]
    pub debounce_quiet_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            chat_url: default_chat_url(),
            debounce_quiet_ms: default_debounce_quiet_ms(),
        }
    }
}

impl ClientConfig {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf, crate::error::Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            crate::error::Error::Configuration("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("folio").join("config.toml"))
    }

    /// Load config from disk, or return defaults if not found
    pub fn load() -> Result<Self, crate::error::Error> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self, crate::error::Error> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            match toml::from_str(&contents) {
                Ok(config) => Ok(config),
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse config file at {:?}: {}. Using defaults.",
                        path,
                        e
                    );
                    Ok(Self::default())
                }
            }
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to disk
    pub fn save(&self) -> Result<(), crate::error::Error> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self).map_err(|e| {
            crate::error::Error::Configuration(format!("Failed to serialize config: {e}"))
        })?;

        std::fs::write(&path, contents)?;

        Ok(())
    }

    pub fn debounce_quiet_period(&self) -> Duration {
        Duration::from_millis(self.debounce_quiet_ms)
    }
}
