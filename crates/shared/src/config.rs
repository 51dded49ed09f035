//! Client configuration, persisted as JSON in the platform config dir.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/api";

/// Settings the client needs before it can talk to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the backend API, including the `/api` prefix.
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load the saved config, falling back to defaults. The
    /// `STUDYDESK_API_URL` environment variable overrides the stored URL.
    pub fn load() -> Self {
        let mut config: ClientConfig = fs::read_to_string(Self::path())
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        if let Ok(url) = std::env::var("STUDYDESK_API_URL") {
            if !url.trim().is_empty() {
                config.base_url = url;
            }
        }
        config
    }

    pub fn save(&self) {
        let path = Self::path();
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(err) = fs::write(&path, json) {
                    tracing::warn!("could not save settings to {}: {err}", path.display());
                }
            }
            Err(err) => tracing::warn!("could not serialize settings: {err}"),
        }
    }

    fn path() -> PathBuf {
        directories::ProjectDirs::from("com.local", "Study Desk", "StudyDesk")
            .map(|p| p.config_dir().join("settings.json"))
            .unwrap_or_else(|| PathBuf::from("./settings.json"))
    }
}
