use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use face_ledger_core::shared::constants::{DEFAULT_BUCKET, DEFAULT_COLLECTION_ID};

/// Defaults for flags the user rarely changes between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_collection_id")]
    pub collection_id: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
}

fn default_collection_id() -> String {
    DEFAULT_COLLECTION_ID.to_string()
}

fn default_bucket() -> String {
    DEFAULT_BUCKET.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            collection_id: default_collection_id(),
            bucket: default_bucket(),
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("FaceLedger").join("settings.json"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Reads settings from `path`, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load_from(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }

    pub fn save(&self) {
        match Self::config_path() {
            Some(path) => self.save_to(&path),
            None => log::warn!("No config directory; settings not saved"),
        }
    }

    pub fn save_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => match fs::write(path, json) {
                Ok(()) => log::info!("Settings saved to {}", path.display()),
                Err(e) => log::warn!("Failed to save settings to {}: {e}", path.display()),
            },
            Err(e) => log::warn!("Failed to serialize settings: {e}"),
        }
    }
}
