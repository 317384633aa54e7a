//! Explicit cancellation handle for a running interview.
//!
//! Whatever reacts to an interrupt (signal handler, UI button, test) gets a
//! clone of the token from the [`InterviewContext`]; the run loop checks it at
//! every prompt boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Per-run context handed to the orchestrator and to interrupt handlers.
#[derive(Debug, Clone, Default)]
pub struct InterviewContext {
    pub cancel: CancellationToken,
}

impl InterviewContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}
