//! User-facing transient notifications
//!
//! Every mutating operation (and a failed fetch) produces a short-lived,
//! auto-dismissing message with a severity. The app publishes them on the
//! event hub; the host decides how to show them.

use serde::{Deserialize, Serialize};

/// How long a notification stays visible unless configured otherwise
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Warning,
}

/// A transient message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub severity:   Severity,
    pub message:    String,
    pub timeout_ms: u64,
}

impl Notification {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}
