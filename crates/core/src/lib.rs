//! prompt-box core: a personal prompt library
//!
//! Two collections of reusable prompts: a `local` one the user edits, kept
//! as a single JSON blob in a key-value store, and a read-only `online` one
//! fetched from a URL. The host (the Neovim binding, or tests) drives an
//! [`App`] through the command registry and listens to its [`Hub`].
//!
//! ## Architecture
//!
//! - **store**: both collections, filter state, import/export
//! - **app**: user actions on top of the store, notifications
//! - **commands**: "category.action" registry for FFI callers
//! - **db**: key-value storage and the local collection blob
//! - **remote**: HTTP fetch of the online list

pub mod app;
pub mod commands;
pub mod config;
pub mod db;
pub mod errors;
pub mod hub;
pub mod notifications;
pub mod prompt;
pub mod remote;
pub mod services;
pub mod store;
pub mod view;

pub use app::{App, EditDraft, HeadlessHost, Host};
pub use config::Config;
pub use errors::{PromptBoxError, Result};
pub use hub::{AppEvent, Hub};
pub use notifications::{Notification, Severity};
pub use prompt::{Prompt, PromptRecord, Source};
pub use store::{ConfirmationToken, FetchOutcome, FetchTicket, PromptStore};
pub use view::ViewModel;
