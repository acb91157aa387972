//! Backend configuration stored in ~/.boardsync/config.json.
//!
//! Embedding applications may also construct a [`BackendConfig`] directly
//! and skip the file entirely (tests do).

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Quiescence window for debounced refetch after a criteria change.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendConfig {
    /// Base URL of the task backend, e.g. `https://api.example.com/v1`.
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Display name used to match "my tasks" against item owners.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub debounce_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_token: None,
            user_name: None,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

pub fn config_path() -> Result<PathBuf, SyncError> {
    let home = dirs::home_dir()
        .ok_or_else(|| SyncError::Config("Could not find home directory".to_string()))?;
    Ok(home.join(".boardsync").join("config.json"))
}

pub fn load_config() -> Result<BackendConfig, SyncError> {
    let path = config_path()?;

    if !path.exists() {
        return Err(SyncError::Config(format!(
            "Config file not found at {}. Create it with: {{ \"baseUrl\": \"https://...\" }}",
            path.display()
        )));
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| SyncError::Config(format!("Failed to read config: {}", e)))?;

    let config: BackendConfig = serde_json::from_str(&content)
        .map_err(|e| SyncError::Config(format!("Failed to parse config: {}", e)))?;

    if config.base_url.is_empty() {
        return Err(SyncError::Config("baseUrl is required".to_string()));
    }

    Ok(config)
}
