//! Opaque connection identity.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counter. Relaxed ordering is enough: only uniqueness matters.
static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Identity token correlating a connection with application hooks.
///
/// Handles carry no structure beyond identity; they are passed to the
/// socket-init and tls-init hooks so the application can tell connections
/// apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionHandle(u64);

impl ConnectionHandle {
    /// Allocate a fresh, never-before-seen handle.
    pub fn next() -> Self {
        Self(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_handles_unique() {
        let handles: HashSet<_> = (0..100).map(|_| ConnectionHandle::next()).collect();
        assert_eq!(handles.len(), 100);
    }

    #[test]
    fn test_display() {
        let handle = ConnectionHandle::next();
        assert_eq!(handle.to_string(), format!("conn-{}", handle.as_u64()));
    }
}
