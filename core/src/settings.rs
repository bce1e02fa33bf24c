//! Scanner settings.
//!
//! Optional overrides are read from `<config dir>/wslports/settings.json`
//! (e.g. `%APPDATA%\wslports\settings.json` on Windows). Missing fields fall
//! back to their defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{Error, Result};

/// Settings that control how instances are enumerated and scanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Program used to reach the instances.
    pub wsl_command: String,

    /// Command run inside each instance to list listening sockets.
    pub socket_command: Vec<String>,

    /// User the socket command runs as. Root sees every owning process.
    pub user: String,

    /// Upper bound for every external command, in seconds.
    pub command_timeout_secs: u64,

    /// Where the generated forwarder configuration is written.
    pub output_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            wsl_command: "wsl".to_string(),
            socket_command: vec!["ss".to_string(), "-tlnp".to_string()],
            user: "root".to_string(),
            command_timeout_secs: 30,
            output_file: PathBuf::from("wsl2-services-config.json"),
        }
    }
}

impl Settings {
    /// Timeout applied to each command invocation.
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Default settings file location, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("wslports").join("settings.json"))
    }

    /// Load settings from the default location, or defaults if absent.
    pub async fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path).await,
            None => Ok(Self::default()),
        }
    }

    /// Load settings from a file.
    ///
    /// Returns defaults if the file doesn't exist.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read settings: {}", e)))?;

        let settings: Settings = serde_json::from_str(&content)?;

        if settings.socket_command.is_empty() {
            return Err(Error::Config("socket_command cannot be empty".to_string()));
        }
        if settings.command_timeout_secs == 0 {
            return Err(Error::Config(
                "command_timeout_secs must be at least 1".to_string(),
            ));
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_nonexistent() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("settings.json")).await.unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.command_timeout(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_partial_override() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"command_timeout_secs": 5, "user": "admin"}"#).unwrap();

        let settings = Settings::load(&path).await.unwrap();
        assert_eq!(settings.command_timeout_secs, 5);
        assert_eq!(settings.user, "admin");
        assert_eq!(settings.wsl_command, "wsl");
        assert_eq!(settings.socket_command, vec!["ss", "-tlnp"]);
    }

    #[tokio::test]
    async fn test_rejects_bad_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        std::fs::write(&path, r#"{"socket_command": []}"#).unwrap();
        assert!(matches!(Settings::load(&path).await, Err(Error::Config(_))));

        std::fs::write(&path, r#"{"command_timeout_secs": 0}"#).unwrap();
        assert!(matches!(Settings::load(&path).await, Err(Error::Config(_))));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(Settings::load(&path).await, Err(Error::Json(_))));
    }
}
