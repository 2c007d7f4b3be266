use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::settings::Settings;

const APP_DIR: &str = "stopwatch";
const SETTINGS_FILE: &str = "settings.json";
const CONFIG_ENV: &str = "STOPWATCH_CONFIG";

#[derive(Debug)]
pub enum StorageError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "settings I/O failed: {}", e),
            StorageError::Json(e) => write!(f, "settings encoding failed: {}", e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Json(e) => Some(e),
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        StorageError::Io(e)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Json(e)
    }
}

/// JSON settings file.
pub struct SettingsStorage {
    path: PathBuf,
}

impl SettingsStorage {
    /// `$STOPWATCH_CONFIG`, else the platform config dir, else `./.stopwatch/`.
    pub fn new() -> Self {
        let path = match std::env::var_os(CONFIG_ENV) {
            Some(path) => PathBuf::from(path),
            None => dirs::config_dir()
                .map(|d| d.join(APP_DIR))
                .unwrap_or_else(|| PathBuf::from(".").join(format!(".{}", APP_DIR)))
                .join(SETTINGS_FILE),
        };
        Self::at(path)
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file gives defaults silently; unreadable or corrupt gives
    /// defaults with a warning. Values are sanitized before returning.
    pub fn load(&self) -> Settings {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Settings::default(),
            Err(e) => {
                log::warn!("could not read {}: {}", self.path.display(), e);
                return Settings::default();
            }
        };
        match serde_json::from_str::<Settings>(&content) {
            Ok(settings) => settings.sanitized(),
            Err(e) => {
                log::warn!("corrupt settings {}: {}. Using defaults.", self.path.display(), e);
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, data)?;
        log::debug!("settings saved to {}", self.path.display());
        Ok(())
    }
}
