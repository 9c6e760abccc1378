//! Ctrl+C handling for the binaries
//!
//! The signal handler only flips a flag and wakes the waiter; the actual
//! teardown (stopping schedules, unsubscribing the stream) runs on the
//! runtime in `main`.

use crate::errors::{SyncError, SyncResult};
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);
static SHUTDOWN_NOTIFY: Lazy<Arc<Notify>> = Lazy::new(|| Arc::new(Notify::new()));

/// Install the Ctrl+C handler; can only be done once per process
pub fn install_shutdown_handler() -> SyncResult<()> {
    let notify = Arc::clone(&SHUTDOWN_NOTIFY);
    ctrlc::set_handler(move || {
        if SHUTDOWN_REQUESTED.swap(true, Ordering::SeqCst) {
            // Second Ctrl+C: stop waiting for a clean teardown
            eprintln!("\n[SIGNAL] Forced exit");
            std::process::exit(130);
        }
        println!("\n[SIGNAL] Received Ctrl+C, shutting down...");
        notify.notify_one();
    })
    .map_err(|e| SyncError::Config(format!("Failed to install Ctrl+C handler: {}", e)))
}

pub fn is_shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}

/// Resolve once shutdown has been requested
pub async fn wait_for_shutdown() {
    if is_shutdown_requested() {
        return;
    }
    SHUTDOWN_NOTIFY.notified().await;
}
