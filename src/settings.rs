//! Server settings
//!
//! Read from a JSON file named by `TOKEN_RAIN_SETTINGS`, with `PORT`
//! overriding the listen port. Anything missing or unreadable falls back to
//! defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Env var naming the settings file
pub const SETTINGS_ENV: &str = "TOKEN_RAIN_SETTINGS";
/// Env var overriding the listen port
pub const PORT_ENV: &str = "PORT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Interface to bind
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Minimum hours between two session starts for one player
    pub cooldown_hours: u64,
    /// Optional gameplay tuning file
    pub tuning_path: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cooldown_hours: 4,
            tuning_path: None,
        }
    }
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_hours * 60 * 60)
    }

    /// Read settings from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Resolve settings from an optional file and an optional port override
    pub fn resolve(settings_path: Option<&str>, port: Option<&str>) -> Self {
        let mut settings = match settings_path {
            Some(path) => match Self::from_file(Path::new(path)) {
                Ok(settings) => {
                    log::info!("Loaded settings from {path}");
                    settings
                }
                Err(e) => {
                    log::warn!("{e}, using default settings");
                    Self::default()
                }
            },
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        };

        if let Some(port) = port {
            match port.parse() {
                Ok(port) => settings.port = port,
                Err(_) => log::warn!("Ignoring invalid {PORT_ENV}={port}"),
            }
        }
        settings
    }

    /// Load settings from the process environment
    pub fn load() -> Self {
        let path = std::env::var(SETTINGS_ENV).ok();
        let port = std::env::var(PORT_ENV).ok();
        Self::resolve(path.as_deref(), port.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ServerSettings::resolve(None, None);
        assert_eq!(settings.bind_addr(), "0.0.0.0:3000");
        assert_eq!(settings.cooldown(), Duration::from_secs(14_400));
    }

    #[test]
    fn test_port_override() {
        assert_eq!(ServerSettings::resolve(None, Some("8080")).port, 8080);
        assert_eq!(ServerSettings::resolve(None, Some("not-a-port")).port, 3000);
    }

    #[test]
    fn test_unreadable_file_falls_back() {
        let settings = ServerSettings::resolve(Some("/nonexistent/settings.json"), Some("9000"));
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.cooldown_hours, 4);
    }

    #[test]
    fn test_partial_json() {
        let settings: ServerSettings =
            serde_json::from_str(r#"{"host": "127.0.0.1", "tuning_path": "tuning.json"}"#).unwrap();
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.tuning_path, Some(PathBuf::from("tuning.json")));
    }
}
