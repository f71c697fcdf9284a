//! FFI (Foreign Function Interface) layer for Lua ↔ Rust communication
//!
//! This module provides the boundary between Lua and Rust, handling:
//! - Plugin setup and the single app instance
//! - Command dispatch
//! - Error conversion to Lua-friendly formats

use std::sync::{Mutex, MutexGuard, PoisonError};

use crossbeam_channel::Receiver;
use nvim_oxi::serde::{Deserializer, Serializer};
use nvim_oxi::{Dictionary, Object};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use prompt_box_core::commands;
use prompt_box_core::{App, AppEvent, Config, PromptBoxError, Result};

use crate::bridge::{self, BridgeEvent};
use crate::host::{self, NvimHost};
use crate::{logging, runtime};

/// Handled here instead of the registry: it starts a background fetch
pub const REFRESH_COMMAND: &str = "prompts.refresh";

struct State {
    app:    App,
    events: Receiver<AppEvent>,
}

/// The app created by `setup()`; a second `setup()` replaces it
static STATE: Lazy<Mutex<Option<State>>> = Lazy::new(|| Mutex::new(None));

/// Called from Lua as: `ffi.setup(opts)`
pub fn setup(config: Object) -> nvim_oxi::Result<Object> {
    let config_value = object_to_value(config)?;

    let result = setup_impl(config_value);
    flush_events();
    match result {
        Ok(value) => value_to_object(value),
        Err(err) => Ok(create_error_object(&err)),
    }
}

/// Main FFI entry point for command execution
///
/// Called from Lua as: `ffi.call(command, args)`
///
/// # Arguments
/// * `command` - Command name in format "category.action" (e.g., "prompts.save")
/// * `args` - Command arguments as a table
///
/// # Returns
/// Result as a table, or an error table `{error, message, category}`
pub fn call(command: String, args: Object) -> nvim_oxi::Result<Object> {
    let args_value = object_to_value(args)?;

    let result = dispatch_command(&command, args_value);
    flush_events();
    match result {
        Ok(value) => value_to_object(value),
        Err(err) => {
            warn!(command = %command, category = err.category(), error = %err, "command failed");
            Ok(create_error_object(&err))
        },
    }
}

/// Every command name `call` accepts, sorted
pub fn command_names() -> nvim_oxi::Result<Vec<String>> {
    let mut names = commands::list_commands();
    names.push(REFRESH_COMMAND.to_string());
    names.sort();
    Ok(names)
}

fn setup_impl(config_value: Value) -> Result<Value> {
    let config = Config::from_value(config_value)?;
    logging::init(&config);
    bridge::init()?;

    let mut app = App::from_config(config, Box::new(NvimHost))?;
    let events = app.hub().subscribe();
    app.load_local();

    let fetch_on_startup = app.config().fetch_on_startup;
    info!(local = app.store().counts().local, fetch_on_startup, "prompt-box set up");
    *lock_state() = Some(State { app, events });

    if fetch_on_startup {
        start_refresh(false)?;
    }
    Ok(json!({ "success": true }))
}

fn dispatch_command(command: &str, args: Value) -> Result<Value> {
    if command == REFRESH_COMMAND {
        start_refresh(true)?;
        return Ok(json!({ "started": true }));
    }
    with_app(|app| commands::dispatch(app, command, args))
}

/// Fetch the online list on the runtime; the bridge applies the result
fn start_refresh(announce: bool) -> Result<()> {
    let (ticket, remote) = with_app(|app| Ok((app.begin_fetch(), app.remote())))?;

    runtime::spawn(async move {
        let result = remote.fetch_prompts().await;
        bridge::send_event(BridgeEvent::FetchFinished { ticket, result, announce });
    });
    Ok(())
}

/// Run `f` against the app, failing if `setup()` has not been called
pub(crate) fn with_app<R>(f: impl FnOnce(&mut App) -> Result<R>) -> Result<R> {
    match lock_state().as_mut() {
        Some(state) => f(&mut state.app),
        None => Err(PromptBoxError::Config("not set up, call setup() first".into())),
    }
}

/// Hand queued hub events to Neovim
///
/// Runs without the state lock held: autocmd listeners may call back in.
pub(crate) fn flush_events() {
    let events = match lock_state().as_ref() {
        Some(state) => host::drain(&state.events),
        None => return,
    };
    host::flush(events);
}

fn lock_state() -> MutexGuard<'static, Option<State>> {
    STATE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Convert nvim-oxi Object to serde_json::Value
///
/// Uses nvim-oxi's Deserializer to convert Object → serde types
fn object_to_value(obj: Object) -> nvim_oxi::Result<Value> {
    let deserializer = Deserializer::new(obj);
    Value::deserialize(deserializer).map_err(nvim_oxi::Error::Deserialize)
}

/// Convert serde_json::Value to nvim-oxi Object
///
/// Uses nvim-oxi's Serializer to convert serde types → Object
fn value_to_object(value: Value) -> nvim_oxi::Result<Object> {
    value
        .serialize(Serializer::new())
        .map_err(nvim_oxi::Error::Serialize)
}

/// Create a structured error object for Lua
///
/// Returns a Dictionary with fields:
/// - `error`: true (marker that this is an error response)
/// - `message`: user-friendly error message
/// - `category`: error category for logging/handling
fn create_error_object(err: &PromptBoxError) -> Object {
    let error_dict = Dictionary::from_iter([
        ("error", Object::from(true)),
        ("message", Object::from(err.user_message())),
        ("category", Object::from(err.category())),
    ]);
    Object::from(error_dict)
}
