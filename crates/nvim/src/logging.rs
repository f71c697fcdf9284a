//! File logging
//!
//! JSON lines in `<data dir>/logs/prompt-box.log.<date>`. The filter comes
//! from `PROMPT_BOX_LOG` when set, otherwise from the `logLevel` option.
//! Neovim owns stdout/stderr, so nothing is written there.

use std::fs;
use std::path::Path;

use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use prompt_box_core::Config;

/// Environment variable overriding the configured filter
pub const LOG_ENV: &str = "PROMPT_BOX_LOG";

/// Keeps the background writer alive for the life of the process
static GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Install the global subscriber; later calls are no-ops
pub fn init(config: &Config) {
    if GUARD.get().is_some() {
        return;
    }
    let Ok(log_dir) = config.log_dir() else {
        return;
    };
    if let Some(guard) = init_file_logger(&log_dir, &config.log_level) {
        let _ = GUARD.set(guard);
    }
}

fn init_file_logger(log_dir: &Path, default_filter: &str) -> Option<WorkerGuard> {
    if fs::create_dir_all(log_dir).is_err() {
        return None;
    }
    let file_appender = tracing_appender::rolling::daily(log_dir, "prompt-box.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter))
        .json()
        .with_writer(writer)
        .try_init()
        .is_ok();

    installed.then_some(guard)
}

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
