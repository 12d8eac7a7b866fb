//! Shutdown state for a build run.
//!
//! Ctrl+C flips a process-wide [`CancelToken`]. Worker pools poll the token
//! they were handed before starting each item, so outstanding work stops and
//! the run ends with [`BuildError::Interrupted`](super::BuildError::Interrupted)
//! before the manifest is written.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

/// Shared cancellation flag.
///
/// Cloning shares the flag. Tests create their own token instead of touching
/// the process-wide one.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Uses Relaxed ordering: worst case a worker starts one more item
    /// before it notices.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Process-wide token flipped by the Ctrl+C handler.
static SHUTDOWN: LazyLock<CancelToken> = LazyLock::new(CancelToken::new);

/// Setup the global Ctrl+C handler. Call once at program start.
///
/// The first interrupt cancels outstanding work; a second one exits immediately.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        if SHUTDOWN.is_cancelled() {
            std::process::exit(130);
        }
        SHUTDOWN.cancel();
        crate::log!("build"; "interrupted, stopping workers...");
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Token tied to the Ctrl+C handler.
pub fn shutdown_token() -> CancelToken {
    SHUTDOWN.clone()
}
