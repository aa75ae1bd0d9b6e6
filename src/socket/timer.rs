//! One-shot handshake deadline timer.

use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

/// Deadline timer bound to a reactor.
///
/// Created unarmed at bind time. Arming spawns a sleeping task on the
/// reactor; cancelling aborts it, and an aborted timer never runs its
/// expiry action.
#[derive(Debug)]
pub struct HandshakeTimer {
    reactor: Handle,
    deadline: Duration,
    armed: Option<AbortHandle>,
}

impl HandshakeTimer {
    pub fn new(reactor: Handle, deadline: Duration) -> Self {
        Self {
            reactor,
            deadline,
            armed: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Arm the timer. `on_expiry` runs on the reactor once the deadline
    /// elapses, unless the returned handle is aborted first.
    ///
    /// Re-arming cancels any previous deadline.
    pub fn arm<F>(&mut self, on_expiry: F) -> AbortHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        let deadline = self.deadline;
        let task = self.reactor.spawn(async move {
            tokio::time::sleep(deadline).await;
            on_expiry();
        });
        let handle = task.abort_handle();
        self.armed = Some(handle.clone());
        handle
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.armed.take() {
            handle.abort();
        }
    }
}
