//! Connection factory holding application hooks.

use super::config::TransportConfig;
use super::connection::{Connection, Security};
use super::handle::ConnectionHandle;
use super::handlers::HandlerConfig;
use crate::base::error::TransportError;
use boring::ssl::SslContext;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

/// Endpoint-level transport policy.
///
/// Holds the hook pair and timing applied to every connection it creates.
/// Hooks are not validated here: a missing tls-init hook surfaces when the
/// connection binds.
#[derive(Debug, Clone, Default)]
pub struct Endpoint {
    security: Security,
    handlers: HandlerConfig,
    config: TransportConfig,
}

impl Endpoint {
    /// An endpoint producing TLS connections.
    pub fn secure() -> Self {
        Self::new(Security::Tls)
    }

    /// An endpoint producing plaintext connections.
    pub fn plain() -> Self {
        Self::new(Security::Plain)
    }

    pub fn new(security: Security) -> Self {
        Self {
            security,
            handlers: HandlerConfig::default(),
            config: TransportConfig::default(),
        }
    }

    pub fn is_secure(&self) -> bool {
        self.security == Security::Tls
    }

    pub fn security(&self) -> Security {
        self.security
    }

    /// Set the socket init handler.
    ///
    /// Called after a connection's socket is bound but before any handshake
    /// bytes flow, so the application can set TCP options.
    pub fn set_socket_init_handler<F>(&mut self, handler: F)
    where
        F: Fn(ConnectionHandle, &TcpStream) + Send + Sync + 'static,
    {
        self.handlers = std::mem::take(&mut self.handlers).with_socket_init(Arc::new(handler));
    }

    /// Set the TLS init handler.
    ///
    /// Called once per connection at bind time. It must return a context for
    /// secure connections to bind; returning `None` fails the bind.
    pub fn set_tls_init_handler<F>(&mut self, handler: F)
    where
        F: Fn(ConnectionHandle) -> Option<SslContext> + Send + Sync + 'static,
    {
        self.handlers = std::mem::take(&mut self.handlers).with_tls_init(Arc::new(handler));
    }

    pub fn set_handshake_timeout(&mut self, timeout: Duration) -> Result<(), TransportError> {
        self.set_config(self.config.handshake_timeout(timeout))
    }

    pub fn set_shutdown_timeout(&mut self, timeout: Duration) -> Result<(), TransportError> {
        self.set_config(self.config.shutdown_timeout(timeout))
    }

    /// Replace the timing configuration. Invalid values leave the current
    /// configuration in place.
    pub fn set_config(&mut self, config: TransportConfig) -> Result<(), TransportError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn handlers(&self) -> &HandlerConfig {
        &self.handlers
    }

    /// Copy the current hooks and timing onto `connection`.
    pub fn initialize(&self, connection: &mut Connection) {
        tracing::trace!(connection = %connection.handle(), handlers = ?self.handlers, "initializing connection");
        connection.configure(self.handlers.clone(), self.config);
    }

    /// Create and initialize a connection of this endpoint's security.
    pub fn new_connection(&self) -> Connection {
        let mut connection = Connection::new(self.security);
        self.initialize(&mut connection);
        connection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability() {
        assert!(Endpoint::secure().is_secure());
        assert!(!Endpoint::plain().is_secure());
        assert!(Endpoint::default().is_secure());
    }

    #[test]
    fn test_invalid_timeout_keeps_previous() {
        let mut endpoint = Endpoint::secure();
        endpoint.set_handshake_timeout(Duration::from_millis(250)).unwrap();

        let err = endpoint.set_handshake_timeout(Duration::ZERO).unwrap_err();
        assert!(matches!(err, TransportError::InvalidTimeout));
        assert_eq!(endpoint.config().handshake_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_new_connection_copies_handlers() {
        let mut endpoint = Endpoint::secure();
        endpoint.set_tls_init_handler(|_| None);
        endpoint.set_handshake_timeout(Duration::from_secs(1)).unwrap();

        let conn = endpoint.new_connection();
        assert!(conn.is_secure());
        assert!(conn.handlers().tls_init().is_some());
        assert!(conn.handlers().socket_init().is_none());
        assert_eq!(conn.handshake_timeout(), Duration::from_secs(1));

        endpoint.set_socket_init_handler(|_, _| {});
        assert!(conn.handlers().socket_init().is_none());
    }
}
