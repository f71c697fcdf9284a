//! App controller
//!
//! The single owner of the prompt store and its collaborators. Each method is
//! one user action: it drives the store, then publishes `StateChanged` and a
//! notification on the hub. Renderers subscribe to the hub and pull a fresh
//! `ViewModel`; the store itself never knows about them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Config;
use crate::db::{FileKeyValueStore, KeyValueStore};
use crate::errors::{PromptBoxError, Result};
use crate::hub::{AppEvent, Hub};
use crate::notifications::Notification;
use crate::prompt::{parse_tags, Prompt, PromptRecord, Source};
use crate::remote::{HttpRemote, RemoteSource};
use crate::services::FileServices;
use crate::store::{ConfirmationToken, FetchOutcome, FetchTicket, PromptStore};
use crate::view::ViewModel;

/// Placeholder title of a fresh draft
pub const NEW_PROMPT_TITLE: &str = "New prompt";
/// Placeholder content of a fresh draft
pub const NEW_PROMPT_CONTENT: &str = "Enter prompt content...";

/// Services provided by the editor/desktop hosting the plugin
pub trait Host: Send {
    fn copy_to_clipboard(&self, text: &str) -> Result<()>;
    /// Put text into the host's search/command input
    fn set_search_input(&self, text: &str) -> Result<()>;
}

/// Host without clipboard or search input
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessHost;

impl Host for HeadlessHost {
    fn copy_to_clipboard(&self, _text: &str) -> Result<()> {
        Err(PromptBoxError::Other("Clipboard not available".into()))
    }

    fn set_search_input(&self, _text: &str) -> Result<()> {
        Err(PromptBoxError::Other("Search input not available".into()))
    }
}

/// Contents of the edit form; `id` is `None` for a prompt not saved yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditDraft {
    #[serde(default)]
    pub id:      Option<String>,
    pub title:   String,
    pub content: String,
    /// Comma-separated, as typed by the user
    #[serde(default)]
    pub tags:    String,
}

pub struct App {
    config: Config,
    store:  PromptStore,
    remote: Arc<dyn RemoteSource>,
    files:  FileServices,
    host:   Box<dyn Host>,
    hub:    Hub,
}

impl App {
    pub fn new(
        config: Config,
        storage: Arc<dyn KeyValueStore>,
        remote: Arc<dyn RemoteSource>,
        files: FileServices,
        host: Box<dyn Host>,
    ) -> Self {
        let store = PromptStore::new(storage, config.storage_key.clone());
        Self {
            config,
            store,
            remote,
            files,
            host,
            hub: Hub::new(),
        }
    }

    /// Wire the default file storage, HTTP remote and directories
    pub fn from_config(config: Config, host: Box<dyn Host>) -> Result<Self> {
        config.validate()?;
        let data_dir = config.data_dir()?;
        let storage = Arc::new(FileKeyValueStore::new(data_dir.join("storage")));
        let remote = Arc::new(HttpRemote::new(config.remote_url.clone()));
        let files = FileServices::new(config.downloads_dir()?, data_dir);
        Ok(Self::new(config, storage, remote, files, host))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &PromptStore {
        &self.store
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    pub fn files(&self) -> &FileServices {
        &self.files
    }

    /// Handle to the remote source, for fetching without holding the app
    pub fn remote(&self) -> Arc<dyn RemoteSource> {
        Arc::clone(&self.remote)
    }

    pub fn view(&self) -> ViewModel {
        ViewModel::build(&self.store)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    pub fn load_local(&mut self) {
        self.store.load_local();
        self.changed();
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.store.begin_fetch()
    }

    /// Apply a finished fetch and tell the user about failures
    ///
    /// `announce` adds a success message (manual refresh).
    pub fn finish_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<PromptRecord>>,
        announce: bool,
    ) -> FetchOutcome {
        let outcome = self.store.finish_fetch(ticket, result);
        match &outcome {
            FetchOutcome::Applied(_) => {
                self.changed();
                if announce {
                    self.notify(Notification::success("Online prompts refreshed"));
                }
            },
            FetchOutcome::Failed(reason) => {
                self.notify(Notification::error(reason.clone()));
            },
            FetchOutcome::Stale => {},
        }
        outcome
    }

    /// Startup fetch: one request, applied in place
    pub async fn fetch_online(&mut self) -> FetchOutcome {
        let ticket = self.begin_fetch();
        let result = self.remote.fetch_prompts().await;
        self.finish_fetch(ticket, result, false)
    }

    /// Manual refresh
    pub async fn refresh(&mut self) -> FetchOutcome {
        let ticket = self.begin_fetch();
        let result = self.remote.fetch_prompts().await;
        self.finish_fetch(ticket, result, true)
    }

    // ========================================================================
    // Filter state
    // ========================================================================

    pub fn select_collection(&mut self, source: Source) {
        self.store.select_collection(source);
        self.changed();
    }

    pub fn set_tag_filter(&mut self, tag: impl Into<String>) {
        self.store.set_tag_filter(tag);
        self.changed();
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.store.set_search_query(query);
        self.changed();
    }

    // ========================================================================
    // Edit flow
    // ========================================================================

    pub fn add_new_prompt(&self) -> EditDraft {
        EditDraft {
            id:      None,
            title:   NEW_PROMPT_TITLE.to_string(),
            content: NEW_PROMPT_CONTENT.to_string(),
            tags:    String::new(),
        }
    }

    pub fn edit_prompt(&self, id: &str) -> Result<EditDraft> {
        let prompt = self
            .store
            .get(Source::Local, id)
            .ok_or_else(|| PromptBoxError::NotFound(id.to_string()))?;

        Ok(EditDraft {
            id:      Some(prompt.id.clone()),
            title:   prompt.title.clone(),
            content: prompt.content.clone(),
            tags:    prompt.tags.join(", "),
        })
    }

    pub fn save_draft(&mut self, draft: &EditDraft) -> Result<Prompt> {
        let tags = parse_tags(&draft.tags);
        let result = match &draft.id {
            None => self.store.create(&draft.title, &draft.content, &tags),
            Some(id) => self.store.update(id, &draft.title, &draft.content, &tags),
        };

        match result {
            Ok(prompt) => {
                self.changed();
                self.notify(Notification::success("Prompt saved"));
                Ok(prompt)
            },
            Err(e) => Err(self.fail(e)),
        }
    }

    // ========================================================================
    // Delete
    // ========================================================================

    pub fn request_delete(&mut self, id: &str) -> ConfirmationToken {
        self.store.request_delete(id)
    }

    pub fn confirm_delete(&mut self, token: ConfirmationToken) -> Result<bool> {
        match self.store.confirm_delete(token) {
            Ok(removed) => {
                if removed {
                    self.changed();
                    self.notify(Notification::success("Prompt deleted"));
                }
                Ok(removed)
            },
            Err(e) => Err(self.fail(e)),
        }
    }

    pub fn cancel_delete(&mut self, token: ConfirmationToken) {
        self.store.cancel_delete(token);
    }

    // ========================================================================
    // Import / export
    // ========================================================================

    pub fn import_text(&mut self, raw: &str) -> Result<usize> {
        match self.store.import(raw) {
            Ok(count) => {
                self.changed();
                self.notify(Notification::success(format!("Imported {} prompts", count)));
                Ok(count)
            },
            Err(e) => {
                warn!(error = %e, "import failed");
                self.notify(Notification::error(format!("Import failed: {}", e.user_message())));
                Err(e)
            },
        }
    }

    /// Import a `.json` file picked by the user
    pub fn import_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let raw = if is_json {
            self.files.read_file(path)
        } else {
            Err(PromptBoxError::Format("Only .json files can be imported".into()))
        };

        match raw {
            Ok(raw) => self.import_text(&raw),
            Err(e) => {
                self.notify(Notification::error(format!("Import failed: {}", e.user_message())));
                Err(e)
            },
        }
    }

    /// Write the local collection to the downloads directory
    pub fn export_to_downloads(&mut self) -> Result<PathBuf> {
        let doc = match self.store.export() {
            Ok(doc) => doc,
            Err(e @ PromptBoxError::Empty(_)) => {
                self.notify(Notification::warning(e.user_message()));
                return Err(e);
            },
            Err(e) => return Err(self.fail(e)),
        };

        match self.files.write_text_file(&doc.contents, Some(&doc.file_name)) {
            Ok(path) => {
                info!(path = %path.display(), count = doc.count, "exported local prompts");
                self.notify(Notification::success(format!("Exported {} prompts", doc.count)));
                Ok(path)
            },
            Err(e) => Err(self.fail(e)),
        }
    }

    // ========================================================================
    // Host hand-offs
    // ========================================================================

    pub fn copy_prompt(&self, source: Source, id: &str) -> Result<()> {
        let prompt = self.find(source, id)?;
        match self.host.copy_to_clipboard(&prompt.content) {
            Ok(()) => {
                self.notify(Notification::success("Copied to clipboard"));
                Ok(())
            },
            Err(e) => {
                warn!(error = %e, "copy failed");
                self.notify(Notification::error("Copy failed"));
                Err(e)
            },
        }
    }

    pub fn send_to_search(&self, source: Source, id: &str) -> Result<()> {
        let prompt = self.find(source, id)?;
        self.host.set_search_input(&prompt.title).inspect_err(|e| {
            warn!(error = %e, "send to search failed");
            self.notify(Notification::error("Failed to send to search"));
        })
    }

    fn find(&self, source: Source, id: &str) -> Result<&Prompt> {
        self.store
            .get(source, id)
            .ok_or_else(|| PromptBoxError::NotFound(id.to_string()))
    }

    fn changed(&self) {
        self.hub.publish(AppEvent::StateChanged);
    }

    fn notify(&self, notification: Notification) {
        self.hub
            .notify(notification.with_timeout(self.config.notification_timeout_ms));
    }

    /// Surface an error as a notification and hand it back
    fn fail(&self, err: PromptBoxError) -> PromptBoxError {
        self.notify(Notification::error(err.user_message()));
        err
    }
}
