//! Remote prompt list
//!
//! One best-effort `GET` per call: no retry, no timeout, no caching headers.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::{PromptBoxError, Result};
use crate::prompt::PromptRecord;

/// Source of the read-only online collection
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch_prompts(&self) -> Result<Vec<PromptRecord>>;
}

/// Fetches a static JSON array over HTTP
#[derive(Debug, Clone)]
pub struct HttpRemote {
    http: Client,
    url:  String,
}

impl HttpRemote {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            url:  url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RemoteSource for HttpRemote {
    async fn fetch_prompts(&self) -> Result<Vec<PromptRecord>> {
        debug!(url = %self.url, "fetching online prompts");

        let response = self.http.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PromptBoxError::Network(format!("HTTP {}", status)));
        }

        let body = response.text().await?;
        let records = decode_remote(&body)?;
        info!(count = records.len(), "fetched online prompts");
        Ok(records)
    }
}

/// Parse the remote document; anything but a JSON array is a network failure
pub fn decode_remote(body: &str) -> Result<Vec<PromptRecord>> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| PromptBoxError::Network(format!("invalid JSON: {}", e)))?;
    let Value::Array(items) = value else {
        return Err(PromptBoxError::Network("expected a JSON array".into()));
    };

    // Entries that aren't objects become empty records and get skipped later
    Ok(items.into_iter().map(PromptRecord::from_value).collect())
}
