//! Command registry and dispatch system
//!
//! Every user action reachable from Lua is registered here as
//! "category.action" (e.g. "prompts.save") and dispatched to a handler that
//! drives the `App`.
//!
//! ## Adding a new command
//!
//! 1. Create handler function: `pub fn my_command(app: &mut App, args: Value) -> Result<Value>`
//! 2. Register in `REGISTRY`: `("category.action", my_command as CommandHandler)`
//! 3. Add tests for the command

pub mod prompts;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::app::App;
use crate::errors::{PromptBoxError, Result};
use crate::prompt::Source;

/// Type alias for command handler functions
///
/// All command handlers take the app and a JSON Value (arguments) and return
/// a Result<Value>
pub type CommandHandler = fn(&mut App, Value) -> Result<Value>;

/// Static command registry
static REGISTRY: Lazy<HashMap<&'static str, CommandHandler>> = Lazy::new(|| {
    let mut map = HashMap::new();

    map.insert("view", prompts::view as CommandHandler);

    // Filter state
    map.insert("prompts.list", prompts::list as CommandHandler);
    map.insert("prompts.select", prompts::select as CommandHandler);
    map.insert("prompts.filter_tag", prompts::filter_tag as CommandHandler);
    map.insert("prompts.search", prompts::search as CommandHandler);
    map.insert("prompts.tags", prompts::tags as CommandHandler);

    // Edit flow
    map.insert("prompts.new", prompts::new_draft as CommandHandler);
    map.insert("prompts.edit", prompts::edit as CommandHandler);
    map.insert("prompts.save", prompts::save as CommandHandler);

    // Delete
    map.insert("prompts.request_delete", prompts::request_delete as CommandHandler);
    map.insert("prompts.confirm_delete", prompts::confirm_delete as CommandHandler);
    map.insert("prompts.cancel_delete", prompts::cancel_delete as CommandHandler);

    // Import / export
    map.insert("prompts.import", prompts::import as CommandHandler);
    map.insert("prompts.export", prompts::export as CommandHandler);

    // Host hand-offs
    map.insert("prompts.copy", prompts::copy as CommandHandler);
    map.insert("prompts.send_to_search", prompts::send_to_search as CommandHandler);

    map
});

/// Dispatch a command by name
pub fn dispatch(app: &mut App, command: &str, args: Value) -> Result<Value> {
    match REGISTRY.get(command) {
        Some(handler) => handler(app, args),
        None => Err(PromptBoxError::CommandNotFound(command.to_string())),
    }
}

/// List all available commands, sorted
pub fn list_commands() -> Vec<String> {
    let mut commands: Vec<String> = REGISTRY.keys().map(|&k| k.to_string()).collect();
    commands.sort();
    commands
}

// ============================================================================
// Argument helpers
// ============================================================================

pub(crate) fn required_str<'a>(args: &'a Value, command: &str, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| PromptBoxError::InvalidArgs {
            command: command.to_string(),
            reason:  format!("missing string field '{}'", key),
        })
}

pub(crate) fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str())
}

/// `source` argument, defaulting to the selected collection
pub(crate) fn source_arg(app: &App, args: &Value, command: &str) -> Result<Source> {
    match optional_str(args, "source") {
        None => Ok(app.store().selected()),
        Some(raw) => Source::parse(raw).ok_or_else(|| PromptBoxError::InvalidArgs {
            command: command.to_string(),
            reason:  format!("unknown source '{}'", raw),
        }),
    }
}
