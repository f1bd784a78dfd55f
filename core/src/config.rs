use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::WatchError;

/// Persisted application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the game client's debug log file.
    pub log_path: String,
    /// How often the tail loop re-checks the file for new bytes.
    pub poll_interval_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_path: default_log_path().to_string_lossy().into_owned(),
            poll_interval_ms: 250,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, WatchError> {
        Ok(confy::load("hearthwatch", None)?)
    }

    pub fn store(&self) -> Result<(), WatchError> {
        Ok(confy::store("hearthwatch", None, self)?)
    }
}

/// Conventional install location of the client's log output.
fn default_log_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        PathBuf::from(r"C:\Program Files (x86)\Hearthstone\Logs\Power.log")
    }
    #[cfg(target_os = "macos")]
    {
        dirs::home_dir()
            .unwrap_or_default()
            .join("Library/Logs/Unity/Player.log")
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        dirs::home_dir()
            .unwrap_or_default()
            .join("Hearthstone/Logs/Power.log")
    }
}
