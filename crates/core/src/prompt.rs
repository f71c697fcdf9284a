//! Prompt record model
//!
//! `Prompt` is the normalized record held by the store. `PromptRecord` is the
//! lenient shape accepted from storage, import files and the remote document,
//! where any field may be missing or mistyped.

use std::fmt;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Which collection a prompt belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    Local,
    Online,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Local => "local",
            Source::Online => "online",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "local" => Some(Source::Local),
            "online" => Some(Source::Online),
            _ => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A titled, taggable block of reusable text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id:         String,
    pub title:      String,
    pub content:    String,
    #[serde(default)]
    pub tags:       Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub source:     Source,
    /// Fields we don't model, carried through save/export untouched
    #[serde(flatten)]
    pub extra:      Map<String, Value>,
}

impl Prompt {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Prompt-like object as found in storage, import files or the remote list
#[derive(Debug, Clone, Default)]
pub struct PromptRecord {
    pub id:         Option<String>,
    pub title:      Option<String>,
    pub content:    Option<String>,
    pub tags:       Option<Vec<String>>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub extra:      Map<String, Value>,
}

impl PromptRecord {
    /// Read a record out of any JSON value
    ///
    /// Known fields of the wrong type count as missing, numeric ids keep
    /// their decimal text, and non-string tags are dropped. Anything that is
    /// not an object yields an empty record.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::default();
        };

        let id = map.remove("id").and_then(|v| match v {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        let tags = map.remove("tags").and_then(|v| match v {
            Value::Array(items) => Some(items.into_iter().filter_map(string_field).collect()),
            _ => None,
        });

        Self {
            id,
            title: map.remove("title").and_then(string_field),
            content: map.remove("content").and_then(string_field),
            tags,
            created_at: map.remove("createdAt").and_then(timestamp_field),
            updated_at: map.remove("updatedAt").and_then(timestamp_field),
            extra: map,
        }
    }

    /// Build a prompt, filling gaps with the given fallbacks
    ///
    /// The owning collection decides `source`; any incoming `source` or
    /// editor-only `isNew` marker is dropped.
    pub fn into_prompt(mut self, source: Source, fallback_id: impl FnOnce() -> String, now: i64) -> Prompt {
        self.extra.remove("source");
        self.extra.remove("isNew");

        Prompt {
            id: self.id.unwrap_or_else(fallback_id),
            title: self.title.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            tags: self.tags.unwrap_or_default(),
            created_at: self.created_at.unwrap_or(now),
            updated_at: self.updated_at.unwrap_or(now),
            source,
            extra: self.extra,
        }
    }
}

impl<'de> Deserialize<'de> for PromptRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

fn string_field(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        _ => None,
    }
}

/// Epoch milliseconds; fractional values are truncated
fn timestamp_field(value: Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}

/// Current time in epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Id for a record created through the edit flow: `local_<ms>`
pub fn local_id(now: i64) -> String {
    format!("local_{}", now)
}

/// Id with a random suffix: `local_<ms>_<9 base-36 chars>`
pub fn local_id_with_suffix(now: i64) -> String {
    format!("local_{}_{}", now, random_suffix(9))
}

fn random_suffix(length: usize) -> String {
    const CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Split a comma-separated tag input (`"a, b"`) into trimmed, non-empty tags
pub fn parse_tags(input: &str) -> Vec<String> {
    normalize_tags(input.split(','))
}

/// Trim tags and drop empty ones, keeping order
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
