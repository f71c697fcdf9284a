//! Global async runtime
//!
//! Online fetches run here; results come back to the main thread through
//! the bridge.

use once_cell::sync::Lazy;
use tokio::runtime::Runtime;

/// Global shared Tokio runtime, built on first use
pub static RUNTIME: Lazy<Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("prompt-box-worker")
        .enable_all()
        .build()
        .expect("Failed to create Tokio runtime")
});

/// Spawn a future on the global runtime
pub fn spawn<F>(future: F) -> tokio::task::JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    RUNTIME.spawn(future)
}
