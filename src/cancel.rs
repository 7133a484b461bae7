//! Cooperative cancellation.
//!
//! One [`CancelToken`] is created per run and threaded through every check,
//! remediation, and acquisition call. Cancelling is cooperative: long-running
//! operations poll [`CancelToken::is_cancelled`] between units of work, and
//! external processes started by [`crate::shell`] are killed when it flips.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{CheckupError, Result};

/// Shared cancellation flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Return `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(CheckupError::Cancelled)
        } else {
            Ok(())
        }
    }
}
