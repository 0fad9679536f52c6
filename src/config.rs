//! Application configuration.
//!
//! Loaded from `config.json` in the app data directory; any missing or
//! unreadable file falls back to the built-in defaults so a fresh install
//! starts without setup.

use std::fs;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use gws_gdrive::service::DEFAULT_APP_FOLDER;
use gws_gdrive::types::scopes;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Base URL of the generation/clone backend.
    pub backend_url: String,
    /// Default model offered to the user.
    pub default_model: String,
    /// Model used server-side for prompt refinement.
    pub refiner_model: String,
    pub google: GoogleConfig,
    /// Name of the Drive folder chats are stored in.
    pub app_folder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleConfig {
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: "https://moving-moray-merely.ngrok-free.app".into(),
            default_model: "gemini-2.5-pro".into(),
            refiner_model: "models/gemini-2.5-flash-lite-preview-06-17".into(),
            google: GoogleConfig::default(),
            app_folder: DEFAULT_APP_FOLDER.into(),
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: "205595350382-7a3mptfofbe1d0puirov0u1q5f5ma4oh.apps.googleusercontent.com"
                .into(),
            redirect_uri: "http://localhost:1420/oauth".into(),
            scope: scopes::DRIVE_FILE.into(),
        }
    }
}

impl AppConfig {
    /// Load from the given path, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Unreadable config at {}, using defaults: {e}", path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = AppConfig::load(Path::new("/definitely/not/here.json"));
        assert_eq!(config.app_folder, DEFAULT_APP_FOLDER);
        assert!(!config.google.client_id.is_empty());
    }

    #[test]
    fn partial_file_fills_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"backendUrl":"https://my.backend"}"#).unwrap();

        let config = AppConfig::load(&path);
        assert_eq!(config.backend_url, "https://my.backend");
        assert_eq!(config.default_model, "gemini-2.5-pro");
    }

    #[test]
    fn corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{{{").unwrap();

        let config = AppConfig::load(&path);
        assert_eq!(config.app_folder, DEFAULT_APP_FOLDER);
    }
}
