//! Bridge between Tokio threads and the Neovim main thread
//!
//! Worker threads cannot touch the Neovim API. Finished fetches are queued
//! on a channel and an `AsyncHandle` wakes the main loop to apply them.

use std::sync::OnceLock;

use nvim_oxi::libuv::AsyncHandle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use prompt_box_core::{FetchTicket, PromptBoxError, PromptRecord, Result};

/// Work handed from Tokio threads to the main thread
#[derive(Debug)]
pub enum BridgeEvent {
    FetchFinished {
        ticket:   FetchTicket,
        result:   Result<Vec<PromptRecord>>,
        /// Manual refresh: report success too
        announce: bool,
    },
}

static BRIDGE: OnceLock<(UnboundedSender<BridgeEvent>, AsyncHandle)> = OnceLock::new();

/// Create the handle (main thread only); later calls are no-ops
pub fn init() -> Result<()> {
    if BRIDGE.get().is_some() {
        return Ok(());
    }

    let (tx, mut rx): (UnboundedSender<BridgeEvent>, UnboundedReceiver<BridgeEvent>) =
        unbounded_channel();

    let handle = AsyncHandle::new(move || {
        while let Ok(event) = rx.try_recv() {
            process_event(event);
        }
        Ok::<_, std::convert::Infallible>(())
    })
    .map_err(|e| PromptBoxError::Other(format!("Failed to create AsyncHandle: {}", e)))?;

    BRIDGE
        .set((tx, handle))
        .map_err(|_| PromptBoxError::Other("Bridge already initialized".into()))?;

    Ok(())
}

/// Queue an event from any thread
pub fn send_event(event: BridgeEvent) {
    if let Some((tx, handle)) = BRIDGE.get() {
        let _ = tx.send(event);
        let _ = handle.send();
    }
}

fn process_event(event: BridgeEvent) {
    match event {
        BridgeEvent::FetchFinished { ticket, result, announce } => {
            debug!(ticket = ticket.0, ok = result.is_ok(), "fetch finished");
            let applied = crate::ffi::with_app(|app| Ok(app.finish_fetch(ticket, result, announce)));
            if applied.is_ok() {
                crate::ffi::flush_events();
            }
        },
    }
}
