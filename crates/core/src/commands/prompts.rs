use serde_json::{json, Value};

use super::{optional_str, required_str, source_arg};
use crate::app::{App, EditDraft};
use crate::errors::{PromptBoxError, Result};
use crate::prompt::Source;
use crate::store::ConfirmationToken;

pub fn view(app: &mut App, _args: Value) -> Result<Value> {
    Ok(serde_json::to_value(app.view())?)
}

/// Visible prompts of a collection (`source` defaults to the selected one)
pub fn list(app: &mut App, args: Value) -> Result<Value> {
    let source = source_arg(app, &args, "prompts.list")?;
    let prompts = app.store().filter_collection(source);
    Ok(json!({ "prompts": prompts }))
}

pub fn select(app: &mut App, args: Value) -> Result<Value> {
    let raw = required_str(&args, "prompts.select", "source")?;
    let source = Source::parse(raw).ok_or_else(|| PromptBoxError::InvalidArgs {
        command: "prompts.select".into(),
        reason:  format!("unknown source '{}'", raw),
    })?;
    app.select_collection(source);
    Ok(json!({ "success": true }))
}

/// Empty or missing `tag` clears the filter
pub fn filter_tag(app: &mut App, args: Value) -> Result<Value> {
    let tag = optional_str(&args, "tag").unwrap_or_default();
    app.set_tag_filter(tag);
    Ok(json!({ "success": true }))
}

pub fn search(app: &mut App, args: Value) -> Result<Value> {
    let query = optional_str(&args, "query").unwrap_or_default();
    app.set_search_query(query);
    Ok(json!({ "success": true }))
}

pub fn tags(app: &mut App, _args: Value) -> Result<Value> {
    Ok(json!({ "tags": app.store().tags() }))
}

pub fn new_draft(app: &mut App, _args: Value) -> Result<Value> {
    Ok(serde_json::to_value(app.add_new_prompt())?)
}

pub fn edit(app: &mut App, args: Value) -> Result<Value> {
    let id = required_str(&args, "prompts.edit", "id")?;
    Ok(serde_json::to_value(app.edit_prompt(id)?)?)
}

/// Save the edit form: `{id?, title, content, tags}`
pub fn save(app: &mut App, args: Value) -> Result<Value> {
    let draft: EditDraft = serde_json::from_value(args).map_err(|e| PromptBoxError::InvalidArgs {
        command: "prompts.save".into(),
        reason:  e.to_string(),
    })?;
    let prompt = app.save_draft(&draft)?;
    Ok(json!(prompt))
}

pub fn request_delete(app: &mut App, args: Value) -> Result<Value> {
    let id = required_str(&args, "prompts.request_delete", "id")?;
    let token = app.request_delete(id);
    Ok(json!({ "token": token }))
}

pub fn confirm_delete(app: &mut App, args: Value) -> Result<Value> {
    let token = token_arg(&args, "prompts.confirm_delete")?;
    let deleted = app.confirm_delete(token)?;
    Ok(json!({ "deleted": deleted }))
}

pub fn cancel_delete(app: &mut App, args: Value) -> Result<Value> {
    let token = token_arg(&args, "prompts.cancel_delete")?;
    app.cancel_delete(token);
    Ok(json!({ "success": true }))
}

/// Import from `{path}` (a `.json` file) or `{text}` (the document itself)
pub fn import(app: &mut App, args: Value) -> Result<Value> {
    let count = if let Some(path) = optional_str(&args, "path") {
        app.import_file(path)?
    } else if let Some(text) = optional_str(&args, "text") {
        app.import_text(text)?
    } else {
        return Err(PromptBoxError::InvalidArgs {
            command: "prompts.import".into(),
            reason:  "expected 'path' or 'text'".into(),
        });
    };
    Ok(json!({ "imported": count }))
}

pub fn export(app: &mut App, _args: Value) -> Result<Value> {
    let path = app.export_to_downloads()?;
    Ok(json!({ "path": path.to_string_lossy() }))
}

pub fn copy(app: &mut App, args: Value) -> Result<Value> {
    let id = required_str(&args, "prompts.copy", "id")?;
    let source = source_arg(app, &args, "prompts.copy")?;
    app.copy_prompt(source, id)?;
    Ok(json!({ "success": true }))
}

pub fn send_to_search(app: &mut App, args: Value) -> Result<Value> {
    let id = required_str(&args, "prompts.send_to_search", "id")?;
    let source = source_arg(app, &args, "prompts.send_to_search")?;
    app.send_to_search(source, id)?;
    Ok(json!({ "success": true }))
}

fn token_arg(args: &Value, command: &str) -> Result<ConfirmationToken> {
    let raw = args.get("token").cloned().unwrap_or(Value::Null);
    serde_json::from_value(raw).map_err(|e| PromptBoxError::InvalidArgs {
        command: command.to_string(),
        reason:  format!("invalid token: {}", e),
    })
}
