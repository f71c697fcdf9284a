use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, warn};

use super::KeyValueStore;
use crate::errors::{PromptBoxError, Result};
use crate::prompt::{local_id, local_id_with_suffix, Prompt, PromptRecord, Source};

/// Read the local collection from storage
///
/// Never fails: a missing key yields an empty collection, and a blob that
/// is not a JSON array is logged, removed from storage and replaced by an
/// empty collection.
pub fn load_local_prompts(store: &dyn KeyValueStore, key: &str, now: i64) -> Vec<Prompt> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(error = %e, key, "failed to read local prompts");
            return Vec::new();
        },
    };

    match decode_local_prompts(&raw) {
        Ok(records) => {
            let prompts = normalize_local(records, now);
            debug!(count = prompts.len(), "loaded local prompts");
            prompts
        },
        Err(e) => {
            warn!(error = %e, key, "discarding corrupted local prompts");
            if let Err(e) = store.remove(key) {
                warn!(error = %e, key, "failed to clear corrupted local prompts");
            }
            Vec::new()
        },
    }
}

/// Overwrite the stored local collection
pub fn save_local_prompts(store: &dyn KeyValueStore, key: &str, prompts: &[Prompt]) -> Result<()> {
    let json = serde_json::to_string(prompts)?;
    store.set(key, &json)?;
    debug!(count = prompts.len(), "saved local prompts");
    Ok(())
}

/// Parse a persisted blob into lenient records
///
/// Only unparsable JSON or a non-array document is corruption. Elements that
/// are not objects are skipped; mistyped fields inside an object are treated
/// as missing.
pub fn decode_local_prompts(raw: &str) -> Result<Vec<PromptRecord>> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| PromptBoxError::StorageCorruption(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(PromptBoxError::StorageCorruption("expected a JSON array".into()));
    };

    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            if !item.is_object() {
                warn!(index, "skipping stored prompt that is not an object");
                return None;
            }
            Some(PromptRecord::from_value(item))
        })
        .collect())
}

fn normalize_local(records: Vec<PromptRecord>, now: i64) -> Vec<Prompt> {
    let mut seen: HashSet<String> = records.iter().filter_map(|r| r.id.clone()).collect();

    records
        .into_iter()
        .map(|record| {
            record.into_prompt(
                Source::Local,
                || {
                    let mut id = local_id(now);
                    while seen.contains(&id) {
                        id = local_id_with_suffix(now);
                    }
                    seen.insert(id.clone());
                    id
                },
                now,
            )
        })
        .collect()
}
