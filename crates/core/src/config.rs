//! Plugin configuration
//!
//! Passed in from the host's `setup()` call. Every field has a default so an
//! empty table is a valid configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::db::LOCAL_PROMPTS_KEY;
use crate::errors::{PromptBoxError, Result};
use crate::notifications::DEFAULT_TIMEOUT_MS;

/// Where the shared prompt list lives
pub const DEFAULT_REMOTE_URL: &str = "https://bueryouth.github.io/prompt-box/prompt-box.json";

/// Directory name used under the platform data directory
pub const APP_DIR_NAME: &str = "prompt-box";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// JSON array of online prompts
    pub remote_url:              String,
    /// Key holding the local collection
    pub storage_key:             String,
    /// Plugin-private data (storage, logs); platform data dir when unset
    pub data_dir:                Option<PathBuf>,
    /// Export target; platform downloads dir when unset
    pub downloads_dir:           Option<PathBuf>,
    pub notification_timeout_ms: u64,
    /// `tracing` filter directive, e.g. `info` or `prompt_box_core=debug`
    pub log_level:               String,
    /// Fetch the online list as soon as the plugin is set up
    pub fetch_on_startup:        bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_url:              DEFAULT_REMOTE_URL.to_string(),
            storage_key:             LOCAL_PROMPTS_KEY.to_string(),
            data_dir:                None,
            downloads_dir:           None,
            notification_timeout_ms: DEFAULT_TIMEOUT_MS,
            log_level:               "info".to_string(),
            fetch_on_startup:        true,
        }
    }
}

impl Config {
    /// Parse a host-provided JSON object (null means defaults)
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        let config: Config = serde_json::from_value(value)
            .map_err(|e| PromptBoxError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.remote_url)
            .map_err(|e| PromptBoxError::Config(format!("remoteUrl: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PromptBoxError::Config(format!(
                "remoteUrl must be http(s), got '{}'",
                url.scheme()
            )));
        }
        if self.storage_key.trim().is_empty() {
            return Err(PromptBoxError::Config("storageKey must not be empty".into()));
        }
        Ok(())
    }

    /// Resolved plugin data directory
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .ok_or_else(|| PromptBoxError::Config("Could not determine data directory".into()))
    }

    /// Resolved downloads directory (falls back to `~/Downloads`)
    pub fn downloads_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.downloads_dir {
            return Ok(dir.clone());
        }
        dirs::download_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join("Downloads")))
            .ok_or_else(|| PromptBoxError::Config("Could not determine downloads directory".into()))
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("logs"))
    }
}
