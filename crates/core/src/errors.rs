//! Error types for prompt-box
//!
//! Every failure in the plugin is recoverable: these errors are turned into
//! notifications by the app controller, or into structured error objects at
//! the FFI boundary.

use thiserror::Error;

/// Result type alias for prompt-box operations
pub type Result<T> = std::result::Result<T, PromptBoxError>;

/// Main error type for prompt-box
#[derive(Debug, Error)]
pub enum PromptBoxError {
    /// Empty title or content on create/update
    #[error("Validation error: {0}")]
    Validation(String),

    /// Update/delete target is not in the local collection
    #[error("Prompt not found: {0}")]
    NotFound(String),

    /// Import payload is not a JSON array of prompts
    #[error("Invalid format: {0}")]
    Format(String),

    /// Persisted local collection failed to parse
    #[error("Corrupted local storage: {0}")]
    StorageCorruption(String),

    /// Remote fetch failed or returned a non-success status
    #[error("Network error: {0}")]
    Network(String),

    /// Nothing to operate on (export of an empty collection)
    #[error("{0}")]
    Empty(String),

    /// Command not found in registry
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    /// Invalid command arguments
    #[error("Invalid arguments for command '{command}': {reason}")]
    InvalidArgs { command: String, reason: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error (catch-all)
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for PromptBoxError {
    fn from(err: anyhow::Error) -> Self {
        PromptBoxError::Other(err.to_string())
    }
}

impl From<reqwest::Error> for PromptBoxError {
    fn from(err: reqwest::Error) -> Self {
        PromptBoxError::Network(err.to_string())
    }
}

impl From<String> for PromptBoxError {
    fn from(err: String) -> Self {
        PromptBoxError::Other(err)
    }
}

impl From<&str> for PromptBoxError {
    fn from(err: &str) -> Self {
        PromptBoxError::Other(err.to_string())
    }
}

impl PromptBoxError {
    /// Get user-friendly error message for display in a notification
    pub fn user_message(&self) -> String {
        match self {
            PromptBoxError::Validation(msg) => msg.clone(),
            PromptBoxError::Format(msg) => msg.clone(),
            PromptBoxError::Empty(msg) => msg.clone(),
            PromptBoxError::CommandNotFound(cmd) => {
                format!("Command '{}' not found. Call commands() for the full list.", cmd)
            },
            PromptBoxError::InvalidArgs { command, reason } => {
                format!("Invalid arguments for '{}': {}", command, reason)
            },
            PromptBoxError::Network(msg) => {
                format!("Could not load online prompts: {}", msg)
            },
            _ => self.to_string(),
        }
    }

    /// Get error category for logging/telemetry
    pub fn category(&self) -> &'static str {
        match self {
            PromptBoxError::Validation(_) => "validation",
            PromptBoxError::NotFound(_) => "not_found",
            PromptBoxError::Format(_) => "format",
            PromptBoxError::StorageCorruption(_) => "storage",
            PromptBoxError::Network(_) => "network",
            PromptBoxError::Empty(_) => "empty",
            PromptBoxError::CommandNotFound(_) => "command",
            PromptBoxError::InvalidArgs { .. } => "arguments",
            PromptBoxError::Serde(_) => "serialization",
            PromptBoxError::Io(_) => "io",
            PromptBoxError::Config(_) => "config",
            PromptBoxError::Other(_) => "other",
        }
    }
}
