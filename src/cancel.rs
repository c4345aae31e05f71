//! Cooperative cancellation token.
//!
//! Cancellation in streamscribe is never preemptive: signalling the token
//! does not interrupt an in-flight model call. The model capability and the
//! streaming poll loop are expected to check the token at their own abort
//! points and unwind early.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared stop signal observed by long-running work.
///
/// Settable once per epoch; `reset()` starts a new epoch on restart/clear.
/// Clones share the same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    signalled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a new, unsignalled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals cancellation to all observers.
    pub fn signal(&self) {
        self.signalled.store(true, Ordering::SeqCst);
    }

    /// Returns true if cancellation has been signalled this epoch.
    pub fn is_signalled(&self) -> bool {
        self.signalled.load(Ordering::SeqCst)
    }

    /// Clears the signal, starting a new epoch.
    pub fn reset(&self) {
        self.signalled.store(false, Ordering::SeqCst);
    }
}
