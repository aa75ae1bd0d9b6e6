//! At-most-once delivery of a handshake outcome.

use crate::base::error::TransportError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Outcome reported to the handshake caller.
pub type HandshakeResult = Result<(), TransportError>;

/// Caller continuation invoked with the terminal outcome.
pub type CompletionFn = Box<dyn FnOnce(HandshakeResult) + Send + 'static>;

/// Single-use guard shared by the handshake and timer tasks.
///
/// Whichever task claims the token first owns the right to report; every
/// later claim fails and must leave the caller untouched.
#[derive(Clone)]
pub struct CompletionToken {
    inner: Arc<TokenInner>,
}

struct TokenInner {
    resolved: AtomicBool,
    callback: Mutex<Option<CompletionFn>>,
}

impl CompletionToken {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(HandshakeResult) + Send + 'static,
    {
        Self {
            inner: Arc::new(TokenInner {
                resolved: AtomicBool::new(false),
                callback: Mutex::new(Some(Box::new(callback))),
            }),
        }
    }

    /// Claim the right to report. Returns true exactly once.
    pub fn try_claim(&self) -> bool {
        self.inner
            .resolved
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.resolved.load(Ordering::Acquire)
    }

    /// Deliver the outcome. Only the claimant may call this; the callback is
    /// taken out of the token so a second delivery is a no-op.
    pub fn deliver(&self, result: HandshakeResult) {
        let callback = self
            .inner
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(callback) = callback {
            callback(result);
        }
    }

    /// Claim and deliver in one step. Returns false if already resolved.
    pub fn complete(&self, result: HandshakeResult) -> bool {
        if !self.try_claim() {
            return false;
        }
        self.deliver(result);
        true
    }
}

impl std::fmt::Debug for CompletionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionToken")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
