//! PromptStore: the two prompt collections and the filter state
//!
//! `local` is mutable and persisted on every mutation; `online` is a
//! read-only snapshot of the last successful fetch. The store never talks to
//! the network or to the user: the app controller feeds it fetch results and
//! turns its errors into notifications.
//!
//! A mutation builds the next `local` collection, writes it, and only then
//! swaps it in, so a failed write leaves memory and storage as they were.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::prompts::{load_local_prompts, save_local_prompts};
use crate::db::KeyValueStore;
use crate::errors::{PromptBoxError, Result};
use crate::prompt::{
    local_id, local_id_with_suffix, normalize_tags, now_millis, Prompt, PromptRecord, Source,
};

/// Single-use token returned by `request_delete`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationToken(pub Uuid);

/// The one delete awaiting the user's answer
#[derive(Debug, Clone)]
struct PendingDelete {
    token: ConfirmationToken,
    id:    String,
}

/// Generation number identifying one online fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FetchTicket(pub u64);

/// What happened to a fetch result handed to `finish_fetch`
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// `online` was replaced with this many prompts
    Applied(usize),
    /// The fetch failed; `online` was left as it was
    Failed(String),
    /// A newer fetch was started; the result was dropped
    Stale,
}

/// Serialized local collection ready to be written somewhere
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub file_name: String,
    pub contents:  String,
    pub count:     usize,
}

/// Number of prompts per collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub local:  usize,
    pub online: usize,
}

/// Owner of both collections and the view filter state
pub struct PromptStore {
    storage:          Arc<dyn KeyValueStore>,
    storage_key:      String,
    local:            Vec<Prompt>,
    online:           Vec<Prompt>,
    selected:         Source,
    tag_filter:       String,
    search_query:     String,
    pending_delete:   Option<PendingDelete>,
    fetch_generation: u64,
}

impl PromptStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, storage_key: impl Into<String>) -> Self {
        Self {
            storage,
            storage_key: storage_key.into(),
            local: Vec::new(),
            online: Vec::new(),
            selected: Source::Local,
            tag_filter: String::new(),
            search_query: String::new(),
            pending_delete: None,
            fetch_generation: 0,
        }
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Replace `local` with the persisted collection (soft-fails to empty)
    pub fn load_local(&mut self) -> &[Prompt] {
        self.local = load_local_prompts(self.storage.as_ref(), &self.storage_key, now_millis());
        info!(count = self.local.len(), "local prompts loaded");
        &self.local
    }

    /// Start a new online fetch; older tickets become stale
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.fetch_generation += 1;
        FetchTicket(self.fetch_generation)
    }

    /// Apply the result of the fetch identified by `ticket`
    ///
    /// Only the most recently issued ticket may touch `online`. A failure
    /// keeps the previous snapshot.
    pub fn finish_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<PromptRecord>>,
    ) -> FetchOutcome {
        if ticket.0 != self.fetch_generation {
            debug!(ticket = ticket.0, latest = self.fetch_generation, "dropping stale fetch result");
            return FetchOutcome::Stale;
        }

        match result {
            Ok(records) => {
                self.online = online_prompts(records, now_millis());
                info!(count = self.online.len(), "online prompts replaced");
                FetchOutcome::Applied(self.online.len())
            },
            Err(e) => {
                warn!(error = %e, "online prompts fetch failed");
                FetchOutcome::Failed(e.user_message())
            },
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn collection(&self, source: Source) -> &[Prompt] {
        match source {
            Source::Local => &self.local,
            Source::Online => &self.online,
        }
    }

    pub fn get(&self, source: Source, id: &str) -> Option<&Prompt> {
        self.collection(source).iter().find(|p| p.id == id)
    }

    pub fn selected(&self) -> Source {
        self.selected
    }

    pub fn tag_filter(&self) -> &str {
        &self.tag_filter
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn counts(&self) -> Counts {
        Counts {
            local:  self.local.len(),
            online: self.online.len(),
        }
    }

    /// Visible prompts of the selected collection
    pub fn filter(&self) -> Vec<&Prompt> {
        self.filter_collection(self.selected)
    }

    /// Prompts of `source` passing the current tag filter and search query
    pub fn filter_collection(&self, source: Source) -> Vec<&Prompt> {
        let query = self.search_query.to_lowercase();
        self.collection(source)
            .iter()
            .filter(|p| p.source == source && matches(p, &self.tag_filter, &query))
            .collect()
    }

    /// Union of tags in the selected collection, in first-seen order
    pub fn tags(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.collection(self.selected)
            .iter()
            .flat_map(|p| p.tags.iter())
            .filter(|tag| seen.insert(tag.as_str()))
            .cloned()
            .collect()
    }

    // ========================================================================
    // Filter state
    // ========================================================================

    /// Switch collection; the tag filter does not carry over
    pub fn select_collection(&mut self, source: Source) {
        self.selected = source;
        self.tag_filter.clear();
    }

    pub fn set_tag_filter(&mut self, tag: impl Into<String>) {
        self.tag_filter = tag.into();
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    // ========================================================================
    // Mutations (local only)
    // ========================================================================

    pub fn create(&mut self, title: &str, content: &str, tags: &[String]) -> Result<Prompt> {
        let (title, content) = validate(title, content)?;
        let now = now_millis();

        let mut id = local_id(now);
        while self.local.iter().any(|p| p.id == id) {
            id = local_id_with_suffix(now);
        }

        let prompt = Prompt {
            id,
            title,
            content,
            tags: normalize_tags(tags),
            created_at: now,
            updated_at: now,
            source: Source::Local,
            extra: Default::default(),
        };

        let mut next = self.local.clone();
        next.push(prompt.clone());
        sort_newest_first(&mut next);
        self.commit(next)?;
        info!(id = %prompt.id, "prompt created");
        Ok(prompt)
    }

    pub fn update(&mut self, id: &str, title: &str, content: &str, tags: &[String]) -> Result<Prompt> {
        let index = self
            .local
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| PromptBoxError::NotFound(id.to_string()))?;
        let (title, content) = validate(title, content)?;

        let mut next = self.local.clone();
        let existing = &mut next[index];
        existing.title = title;
        existing.content = content;
        existing.tags = normalize_tags(tags);
        existing.updated_at = now_millis().max(existing.updated_at.saturating_add(1));
        let updated = existing.clone();

        sort_newest_first(&mut next);
        self.commit(next)?;
        info!(id = %updated.id, "prompt updated");
        Ok(updated)
    }

    /// First step of a delete: remember the target until confirmed
    ///
    /// Only one delete can be pending; a new request voids the previous
    /// token.
    pub fn request_delete(&mut self, id: &str) -> ConfirmationToken {
        let token = ConfirmationToken(Uuid::new_v4());
        self.pending_delete = Some(PendingDelete {
            token,
            id: id.to_string(),
        });
        token
    }

    /// Second step of a delete
    ///
    /// Returns whether a record was removed. Unknown tokens and ids are
    /// no-ops.
    pub fn confirm_delete(&mut self, token: ConfirmationToken) -> Result<bool> {
        let id = match self.pending_delete.take() {
            Some(pending) if pending.token == token => pending.id,
            other => {
                self.pending_delete = other;
                return Ok(false);
            },
        };

        if !self.local.iter().any(|p| p.id == id) {
            return Ok(false);
        }

        let next = self.local.iter().filter(|p| p.id != id).cloned().collect();
        self.commit(next)?;
        info!(id = %id, "prompt deleted");
        Ok(true)
    }

    /// The user declined; forget the token
    pub fn cancel_delete(&mut self, token: ConfirmationToken) {
        if self.pending_delete.as_ref().is_some_and(|p| p.token == token) {
            self.pending_delete = None;
        }
    }

    /// Append every prompt of a JSON array document to `local`
    ///
    /// All or nothing: the whole text must be an array of objects with a
    /// non-empty `title` and `content`. Incoming ids and timestamps are
    /// replaced whatever their type.
    pub fn import(&mut self, raw: &str) -> Result<usize> {
        let records = parse_import(raw)?;
        let now = now_millis();

        let mut taken: HashSet<String> = self.local.iter().map(|p| p.id.clone()).collect();
        let imported: Vec<Prompt> = records
            .into_iter()
            .map(|mut record| {
                record.id = None;
                record.created_at = None;
                record.updated_at = None;
                record.into_prompt(
                    Source::Local,
                    || loop {
                        let id = local_id_with_suffix(now);
                        if taken.insert(id.clone()) {
                            break id;
                        }
                    },
                    now,
                )
            })
            .collect();

        let count = imported.len();
        let mut next = self.local.clone();
        next.extend(imported);
        self.commit(next)?;
        info!(count, "prompts imported");
        Ok(count)
    }

    /// Pretty-printed `local` collection and its dated file name
    pub fn export(&self) -> Result<ExportDocument> {
        self.export_at(Utc::now())
    }

    pub fn export_at(&self, at: DateTime<Utc>) -> Result<ExportDocument> {
        if self.local.is_empty() {
            return Err(PromptBoxError::Empty("No local prompts to export".into()));
        }

        Ok(ExportDocument {
            file_name: format!("prompt-box-export-{}.json", at.format("%Y-%m-%d")),
            contents:  serde_json::to_string_pretty(&self.local)?,
            count:     self.local.len(),
        })
    }

    /// Write `next` and make it the local collection
    fn commit(&mut self, next: Vec<Prompt>) -> Result<()> {
        save_local_prompts(self.storage.as_ref(), &self.storage_key, &next)?;
        self.local = next;
        Ok(())
    }
}

fn sort_newest_first(prompts: &mut [Prompt]) {
    prompts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Tag and search predicate shared by every filter
///
/// `query` must already be lower-cased.
pub fn matches(prompt: &Prompt, tag: &str, query: &str) -> bool {
    let tag_match = tag.is_empty() || prompt.has_tag(tag);
    let search_match = query.is_empty()
        || prompt.title.to_lowercase().contains(query)
        || prompt.content.to_lowercase().contains(query);
    tag_match && search_match
}

fn validate(title: &str, content: &str) -> Result<(String, String)> {
    let title = title.trim();
    let content = content.trim();
    if title.is_empty() || content.is_empty() {
        return Err(PromptBoxError::Validation("Title and content are required".into()));
    }
    Ok((title.to_string(), content.to_string()))
}

fn parse_import(raw: &str) -> Result<Vec<PromptRecord>> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| PromptBoxError::Format(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(PromptBoxError::Format("Expected a JSON array of prompts".into()));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let record = PromptRecord::from_value(item);
            let has_text = |s: &Option<String>| s.as_deref().is_some_and(|s| !s.trim().is_empty());
            if !has_text(&record.title) || !has_text(&record.content) {
                return Err(PromptBoxError::Format(format!(
                    "Item {}: title and content are required",
                    index
                )));
            }
            Ok(record)
        })
        .collect()
}

fn online_prompts(records: Vec<PromptRecord>, now: i64) -> Vec<Prompt> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| {
            if record.title.is_none() || record.content.is_none() {
                warn!(index, "skipping online prompt without title or content");
                return None;
            }
            Some(record.into_prompt(Source::Online, || format!("online_{}", index), now))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::db::MemoryKeyValueStore;

    /// In-memory storage whose writes can be switched to fail
    #[derive(Default)]
    struct FlakyStore {
        inner:       MemoryKeyValueStore,
        fail_writes: AtomicBool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(std::io::Error::other("disk full").into());
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }
    }

    fn new_store() -> (PromptStore, Arc<MemoryKeyValueStore>) {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let store = PromptStore::new(storage.clone(), "localPrompts");
        (store, storage)
    }

    fn tags(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn record(value: Value) -> PromptRecord {
        serde_json::from_value(value).unwrap()
    }

    // ========================================
    // create() / update() tests
    // ========================================

    #[test]
    fn test_create_rejects_empty_fields() {
        let (mut store, storage) = new_store();

        assert!(matches!(store.create("", "x", &[]), Err(PromptBoxError::Validation(_))));
        assert!(matches!(store.create("x", "", &[]), Err(PromptBoxError::Validation(_))));
        assert!(matches!(store.create("   ", "x", &[]), Err(PromptBoxError::Validation(_))));

        assert!(store.collection(Source::Local).is_empty());
        assert_eq!(storage.write_count(), 0);
    }

    #[test]
    fn test_create_persists_and_trims() {
        let (mut store, storage) = new_store();
        let prompt = store.create("  Title ", " Body ", &tags(&["a", " b ", ""])).unwrap();

        assert!(prompt.id.starts_with("local_"));
        assert_eq!(prompt.title, "Title");
        assert_eq!(prompt.content, "Body");
        assert_eq!(prompt.tags, vec!["a", "b"]);
        assert_eq!(prompt.source, Source::Local);
        assert_eq!(prompt.created_at, prompt.updated_at);
        assert_eq!(storage.write_count(), 1);

        let stored: Vec<Prompt> =
            serde_json::from_str(&storage.get("localPrompts").unwrap().unwrap()).unwrap();
        assert_eq!(stored, vec![prompt]);
    }

    #[test]
    fn test_create_assigns_unique_ids() {
        let (mut store, _) = new_store();
        let ids: HashSet<String> = (0..20)
            .map(|i| store.create(&format!("T{}", i), "C", &[]).unwrap().id)
            .collect();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn test_create_sorts_newest_first() {
        let (mut store, _) = new_store();
        store.create("First", "C", &[]).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        store.create("Second", "C", &[]).unwrap();

        let titles: Vec<_> = store.collection(Source::Local).iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Second", "First"]);
    }

    #[test]
    fn test_update_keeps_identity() {
        let (mut store, _) = new_store();
        let created = store.create("Title", "Body", &tags(&["a", "b"])).unwrap();
        let updated = store.update(&created.id, "Title2", "Body2", &tags(&["c"])).unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.title, "Title2");
        assert_eq!(updated.content, "Body2");
        assert_eq!(updated.tags, vec!["c"]);
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(store.collection(Source::Local).len(), 1);
        assert_eq!(store.get(Source::Local, &created.id), Some(&updated));
    }

    #[test]
    fn test_update_saturates_timestamp() {
        let (mut store, storage) = new_store();
        storage
            .set(
                "localPrompts",
                &json!([{"id": "local_1", "title": "T", "content": "C", "createdAt": 1, "updatedAt": i64::MAX}])
                    .to_string(),
            )
            .unwrap();
        store.load_local();

        let updated = store.update("local_1", "T2", "C2", &[]).unwrap();
        assert_eq!(updated.updated_at, i64::MAX);
        assert_eq!(updated.title, "T2");
    }

    #[test]
    fn test_update_unknown_id() {
        let (mut store, _) = new_store();
        assert!(matches!(
            store.update("local_404", "T", "C", &[]),
            Err(PromptBoxError::NotFound(id)) if id == "local_404"
        ));
    }

    #[test]
    fn test_update_validates() {
        let (mut store, _) = new_store();
        let created = store.create("T", "C", &[]).unwrap();
        assert!(matches!(
            store.update(&created.id, "T", " ", &[]),
            Err(PromptBoxError::Validation(_))
        ));
        assert_eq!(store.get(Source::Local, &created.id).unwrap().content, "C");
    }

    #[test]
    fn test_update_does_not_touch_online() {
        let (mut store, _) = new_store();
        let ticket = store.begin_fetch();
        store.finish_fetch(
            ticket,
            Ok(vec![record(json!({"id": "shared", "title": "O", "content": "O"}))]),
        );

        assert!(matches!(
            store.update("shared", "T", "C", &[]),
            Err(PromptBoxError::NotFound(_))
        ));
        assert_eq!(store.get(Source::Online, "shared").unwrap().title, "O");
    }

    // ========================================
    // delete tests
    // ========================================

    #[test]
    fn test_delete_requires_confirmation() {
        let (mut store, _) = new_store();
        let created = store.create("T", "C", &[]).unwrap();

        let token = store.request_delete(&created.id);
        assert_eq!(store.collection(Source::Local).len(), 1);

        assert!(store.confirm_delete(token).unwrap());
        assert!(store.collection(Source::Local).is_empty());

        // Tokens are single-use
        assert!(!store.confirm_delete(token).unwrap());
    }

    #[test]
    fn test_delete_cancelled() {
        let (mut store, _) = new_store();
        let created = store.create("T", "C", &[]).unwrap();

        let token = store.request_delete(&created.id);
        store.cancel_delete(token);

        assert!(!store.confirm_delete(token).unwrap());
        assert_eq!(store.collection(Source::Local).len(), 1);
    }

    #[test]
    fn test_new_delete_request_voids_previous() {
        let (mut store, _) = new_store();
        let first = store.create("First", "C", &[]).unwrap();
        let second = store.create("Second", "C", &[]).unwrap();

        let stale = store.request_delete(&first.id);
        let current = store.request_delete(&second.id);

        assert!(!store.confirm_delete(stale).unwrap());
        store.cancel_delete(stale);
        assert!(store.confirm_delete(current).unwrap());

        let local = store.collection(Source::Local);
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].id, first.id);
    }

    #[test]
    fn test_delete_unknown_id_is_noop() {
        let (mut store, _) = new_store();
        store.create("T", "C", &[]).unwrap();
        let before = store.collection(Source::Local).to_vec();

        let token = store.request_delete("local_missing");
        assert!(!store.confirm_delete(token).unwrap());
        assert_eq!(store.collection(Source::Local), before.as_slice());
    }

    // ========================================
    // import() / export() tests
    // ========================================

    #[test]
    fn test_import_rejects_non_array() {
        let (mut store, _) = new_store();
        store.create("T", "C", &[]).unwrap();

        assert!(matches!(store.import(r#"{"not":"array"}"#), Err(PromptBoxError::Format(_))));
        assert!(matches!(store.import("not json"), Err(PromptBoxError::Format(_))));
        assert_eq!(store.collection(Source::Local).len(), 1);
    }

    #[test]
    fn test_import_is_all_or_nothing() {
        let (mut store, storage) = new_store();
        let result = store.import(r#"[{"title":"A","content":"B"},{"title":"","content":"x"}]"#);

        match result {
            Err(PromptBoxError::Format(msg)) => assert!(msg.contains("Item 1")),
            other => panic!("Expected Format error, got {:?}", other),
        }
        assert!(store.collection(Source::Local).is_empty());
        assert_eq!(storage.write_count(), 0);

        assert!(matches!(store.import(r#"["just a string"]"#), Err(PromptBoxError::Format(_))));
    }

    #[test]
    fn test_import_assigns_fresh_identity() {
        let (mut store, storage) = new_store();
        let existing = store.create("T", "C", &[]).unwrap();

        let count = store
            .import(&format!(
                r#"[{{"id":"{}","title":"A","content":"B","createdAt":1,"updatedAt":1}}]"#,
                existing.id
            ))
            .unwrap();
        assert_eq!(count, 1);

        let local = store.collection(Source::Local);
        assert_eq!(local.len(), 2);
        let imported = local.iter().find(|p| p.title == "A").unwrap();
        assert_ne!(imported.id, existing.id);
        assert!(imported.id.starts_with("local_"));
        assert!(imported.created_at > 1);
        assert_eq!(imported.source, Source::Local);
        assert_eq!(storage.write_count(), 2);
    }

    #[test]
    fn test_import_ignores_incoming_identity_types() {
        let (mut store, _) = new_store();
        let count = store
            .import(
                r#"[
                    {"id":1,"title":"A","content":"B"},
                    {"title":"C","content":"D","createdAt":"yesterday","updatedAt":1.5},
                    {"id":null,"title":"E","content":"F","createdAt":1e3}
                ]"#,
            )
            .unwrap();
        assert_eq!(count, 3);

        let local = store.collection(Source::Local);
        assert!(local.iter().all(|p| p.id.starts_with("local_")));
        assert!(local.iter().all(|p| p.created_at > 1000 && p.updated_at == p.created_at));
        let ids: HashSet<_> = local.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_export_empty() {
        let (store, _) = new_store();
        assert!(matches!(store.export(), Err(PromptBoxError::Empty(_))));
    }

    #[test]
    fn test_export_file_name_and_contents() {
        let (mut store, _) = new_store();
        store.create("T", "Line 1\nLine 2", &tags(&["x"])).unwrap();

        let at = Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 0).unwrap();
        let doc = store.export_at(at).unwrap();
        assert_eq!(doc.file_name, "prompt-box-export-2024-03-09.json");
        assert_eq!(doc.count, 1);
        assert!(doc.contents.starts_with("[\n  {"));

        let parsed: Vec<Prompt> = serde_json::from_str(&doc.contents).unwrap();
        assert_eq!(parsed, store.collection(Source::Local));
    }

    #[test]
    fn test_export_import_roundtrip() {
        let (mut store, _) = new_store();
        store.create("One", "Body 1", &tags(&["a"])).unwrap();
        store.create("Two", "Body 2", &tags(&["b", "c"])).unwrap();
        let doc = store.export().unwrap();

        let (mut fresh, _) = new_store();
        assert_eq!(fresh.import(&doc.contents).unwrap(), 2);

        let tuples = |s: &PromptStore| {
            let mut v: Vec<(String, String, Vec<String>)> = s
                .collection(Source::Local)
                .iter()
                .map(|p| (p.title.clone(), p.content.clone(), p.tags.clone()))
                .collect();
            v.sort();
            v
        };
        assert_eq!(tuples(&fresh), tuples(&store));
    }

    // ========================================
    // storage failure tests
    // ========================================

    #[test]
    fn test_failed_write_leaves_local_unchanged() {
        let storage = Arc::new(FlakyStore::default());
        let mut store = PromptStore::new(storage.clone(), "localPrompts");
        let kept = store.create("Kept", "C", &[]).unwrap();
        let before = store.collection(Source::Local).to_vec();
        let stored_before = storage.get("localPrompts").unwrap();

        storage.fail_writes.store(true, Ordering::SeqCst);

        assert!(matches!(store.create("T", "C", &[]), Err(PromptBoxError::Io(_))));
        assert!(store.update(&kept.id, "Changed", "C", &[]).is_err());
        let token = store.request_delete(&kept.id);
        assert!(store.confirm_delete(token).is_err());
        assert!(store.import(r#"[{"title":"A","content":"B"}]"#).is_err());

        assert_eq!(store.collection(Source::Local), before.as_slice());
        assert_eq!(storage.get("localPrompts").unwrap(), stored_before);

        // Storage recovers; the collection picks up from where it was
        storage.fail_writes.store(false, Ordering::SeqCst);
        store.create("Next", "C", &[]).unwrap();
        let mut reopened = PromptStore::new(storage.clone(), "localPrompts");
        assert_eq!(reopened.load_local().len(), 2);
    }

    // ========================================
    // filter() tests
    // ========================================

    #[test]
    fn test_search_is_case_insensitive() {
        let (mut store, _) = new_store();
        store.create("Greeting", "say hello world", &[]).unwrap();
        store.create("Other", "nothing here", &[]).unwrap();

        store.set_search_query("HELLO");
        let visible = store.filter();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Greeting");

        store.set_search_query("greet");
        assert_eq!(store.filter().len(), 1);
    }

    #[test]
    fn test_tag_filter_is_exact() {
        let (mut store, _) = new_store();
        store.create("T", "C", &tags(&["work", "draft"])).unwrap();

        store.set_tag_filter("work");
        assert_eq!(store.filter().len(), 1);

        store.set_tag_filter("wor");
        assert!(store.filter().is_empty());

        store.set_tag_filter("Work");
        assert!(store.filter().is_empty());
    }

    #[test]
    fn test_filter_uses_selected_collection() {
        let (mut store, _) = new_store();
        store.create("Local", "C", &[]).unwrap();
        let ticket = store.begin_fetch();
        store.finish_fetch(ticket, Ok(vec![record(json!({"title": "Online", "content": "C"}))]));

        assert_eq!(store.filter()[0].title, "Local");
        store.select_collection(Source::Online);
        assert_eq!(store.filter().len(), 1);
        assert_eq!(store.filter()[0].title, "Online");
    }

    #[test]
    fn test_select_collection_clears_tag_filter() {
        let (mut store, _) = new_store();
        store.set_tag_filter("work");
        store.set_search_query("q");
        store.select_collection(Source::Online);
        assert_eq!(store.tag_filter(), "");
        assert_eq!(store.search_query(), "q");
    }

    #[test]
    fn test_tags_union_in_first_seen_order() {
        let (mut store, _) = new_store();
        store.create("A", "C", &tags(&["x", "y"])).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        store.create("B", "C", &tags(&["y", "z"])).unwrap();

        // Newest first: B's tags come first
        assert_eq!(store.tags(), vec!["y", "z", "x"]);
        store.select_collection(Source::Online);
        assert!(store.tags().is_empty());
    }

    // ========================================
    // fetch sequencing tests
    // ========================================

    #[test]
    fn test_fetch_replaces_online() {
        let (mut store, _) = new_store();
        let ticket = store.begin_fetch();
        let outcome = store.finish_fetch(
            ticket,
            Ok(vec![
                record(json!({"id": "o1", "title": "A", "content": "B", "source": "local"})),
                record(json!({"title": "No id", "content": "B"})),
                record(json!({"content": "no title"})),
            ]),
        );

        assert_eq!(outcome, FetchOutcome::Applied(2));
        let online = store.collection(Source::Online);
        assert!(online.iter().all(|p| p.source == Source::Online));
        assert_eq!(online[1].id, "online_1");

        let ticket = store.begin_fetch();
        store.finish_fetch(ticket, Ok(vec![]));
        assert!(store.collection(Source::Online).is_empty());
    }

    #[test]
    fn test_fetch_failure_keeps_previous() {
        let (mut store, _) = new_store();
        store.create("Local", "C", &[]).unwrap();
        let ticket = store.begin_fetch();
        store.finish_fetch(ticket, Ok(vec![record(json!({"title": "A", "content": "B"}))]));

        let ticket = store.begin_fetch();
        let outcome = store.finish_fetch(ticket, Err(PromptBoxError::Network("HTTP 500".into())));
        assert!(matches!(outcome, FetchOutcome::Failed(_)));
        assert_eq!(store.counts(), Counts { local: 1, online: 1 });
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let (mut store, _) = new_store();
        let first = store.begin_fetch();
        let second = store.begin_fetch();

        let outcome = store.finish_fetch(second, Ok(vec![record(json!({"title": "New", "content": "B"}))]));
        assert_eq!(outcome, FetchOutcome::Applied(1));

        let outcome = store.finish_fetch(first, Ok(vec![]));
        assert_eq!(outcome, FetchOutcome::Stale);
        assert_eq!(store.collection(Source::Online)[0].title, "New");
    }

    // ========================================
    // load_local() tests
    // ========================================

    #[test]
    fn test_load_local_from_storage() {
        let (mut store, storage) = new_store();
        store.create("T", "C", &[]).unwrap();

        let mut reopened = PromptStore::new(storage.clone(), "localPrompts");
        assert_eq!(reopened.load_local().len(), 1);
        assert_eq!(reopened.collection(Source::Local), store.collection(Source::Local));
    }

    #[test]
    fn test_load_local_corrupted() {
        let (mut store, storage) = new_store();
        storage.set("localPrompts", "[{broken").unwrap();

        assert!(store.load_local().is_empty());
        assert_eq!(storage.get("localPrompts").unwrap(), None);
    }
}
