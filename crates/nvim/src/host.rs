//! Neovim side of the app: host services and event delivery

use crossbeam_channel::Receiver;
use nvim_oxi::api;
use nvim_oxi::Object;

use prompt_box_core::{AppEvent, Host, Notification, PromptBoxError, Result, Severity};

/// `User` autocmd pattern fired after any state change
pub const CHANGED_PATTERN: &str = "PromptBoxChanged";
/// `User` autocmd pattern fired after a prompt title is sent to search
pub const SEARCH_PATTERN: &str = "PromptBoxSearch";
/// Global variable holding the last text sent to search
pub const SEARCH_VAR: &str = "prompt_box_search";

/// Clipboard is the `+` register; search input is `g:prompt_box_search`
#[derive(Debug, Default, Clone, Copy)]
pub struct NvimHost;

impl Host for NvimHost {
    fn copy_to_clipboard(&self, text: &str) -> Result<()> {
        api::call_function::<_, Object>("setreg", ("+", text))
            .map(|_| ())
            .map_err(|e| PromptBoxError::Other(format!("setreg failed: {}", e)))
    }

    fn set_search_input(&self, text: &str) -> Result<()> {
        api::set_var(SEARCH_VAR, text)
            .map_err(|e| PromptBoxError::Other(format!("set_var failed: {}", e)))?;

        // Listeners may call back into the plugin; run them after this call returns
        nvim_oxi::schedule(|_| {
            fire_user_autocmd(SEARCH_PATTERN);
            Ok::<_, std::convert::Infallible>(())
        });
        Ok(())
    }
}

/// Deliver every queued hub event to Neovim
pub fn flush(events: Vec<AppEvent>) {
    // Collapse repeated state changes into one autocmd
    let mut changed = false;
    for event in events {
        match event {
            AppEvent::StateChanged => changed = true,
            AppEvent::Notification(notification) => show(&notification),
        }
    }
    if changed {
        fire_user_autocmd(CHANGED_PATTERN);
    }
}

/// Drain without blocking
pub fn drain(receiver: &Receiver<AppEvent>) -> Vec<AppEvent> {
    receiver.try_iter().collect()
}

pub fn log_level(severity: Severity) -> api::types::LogLevel {
    match severity {
        Severity::Success => api::types::LogLevel::Info,
        Severity::Warning => api::types::LogLevel::Warn,
        Severity::Error => api::types::LogLevel::Error,
    }
}

#[cfg(not(test))]
fn show(notification: &Notification) {
    use nvim_oxi::Dictionary;

    let opts = Dictionary::from_iter([
        ("title", Object::from("Prompt Box")),
        ("timeout", Object::from(notification.timeout_ms as i64)),
    ]);
    let _ = api::notify(&notification.message, log_level(notification.severity), &opts);
}

#[cfg(test)]
fn show(_notification: &Notification) {}

#[cfg(not(test))]
fn fire_user_autocmd(pattern: &str) {
    let _ = api::exec_autocmds(
        vec!["User"],
        &api::opts::ExecAutocmdsOpts::builder()
            .patterns(vec![pattern])
            .build(),
    );
}

#[cfg(test)]
fn fire_user_autocmd(_pattern: &str) {}
