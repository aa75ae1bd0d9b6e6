//! Transport timing configuration.

use crate::base::error::TransportError;
use std::time::Duration;

/// Default grace window for a TLS handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default bound on a graceful TLS close.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(5000);

/// Per-endpoint transport timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    /// Deadline for the handshake race
    pub handshake_timeout: Duration,
    /// Deadline for sending close_notify during shutdown
    pub shutdown_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the handshake timeout.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set the shutdown timeout.
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Reject zero timeouts.
    pub fn validate(&self) -> Result<(), TransportError> {
        if self.handshake_timeout.is_zero() || self.shutdown_timeout.is_zero() {
            return Err(TransportError::InvalidTimeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TransportConfig::new();
        assert_eq!(config.handshake_timeout, Duration::from_secs(5));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_rejected() {
        let config = TransportConfig::new().handshake_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(TransportError::InvalidTimeout)));

        let config = TransportConfig::new().shutdown_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(TransportError::InvalidTimeout)));
    }
}
