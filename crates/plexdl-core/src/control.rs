//! Run control: cancellation tokens and the Ctrl+C bridge.
//!
//! A `CancelToken` is handed to the driver and the fetcher. The fetcher checks
//! it between chunk writes (and from curl's progress callback while the socket
//! is idle); the driver checks it between tasks. `install_interrupt_handler`
//! makes Ctrl+C set the token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Exit status used when a second Ctrl+C arrives during shutdown (128 + SIGINT).
pub const FORCED_EXIT_CODE: i32 = 130;

/// Error returned when a download is stopped by the user. Distinct from any
/// per-task failure: it unwinds the whole run and leaves the task `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cancelled by user")]
pub struct Cancelled;

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once the token has been triggered.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

/// What one Ctrl+C does to `token`: the first one cancels, a repeat asks for
/// an immediate exit. Returns true for the repeat.
fn on_interrupt(token: &CancelToken) -> bool {
    token.flag.swap(true, Ordering::SeqCst)
}

/// Route Ctrl+C into `token`. A second Ctrl+C while the transfer winds down
/// exits with `FORCED_EXIT_CODE`. Can be installed once per process.
pub fn install_interrupt_handler(token: &CancelToken) -> Result<(), ctrlc::Error> {
    let token = token.clone();
    ctrlc::set_handler(move || {
        if on_interrupt(&token) {
            std::process::exit(FORCED_EXIT_CODE);
        }
        tracing::info!("interrupt received; stopping after the current chunk");
    })
}
