//! Application-supplied connection hooks.

use super::handle::ConnectionHandle;
use boring::ssl::SslContext;
use std::fmt;
use std::sync::Arc;
use tokio::net::TcpStream;

/// Called once, synchronously, before any handshake bytes are exchanged.
/// Gives the application a chance to tune socket options.
pub type SocketInitHandler = Arc<dyn Fn(ConnectionHandle, &TcpStream) + Send + Sync>;

/// Called once during bind to obtain the TLS context for a connection.
/// Returning `None` fails the bind with `InvalidTlsContext`.
pub type TlsInitHandler = Arc<dyn Fn(ConnectionHandle) -> Option<SslContext> + Send + Sync>;

/// Immutable snapshot of the hook pair.
///
/// Endpoints hand a clone of their snapshot to every connection they
/// initialize; reconfiguring the endpoint afterwards leaves existing
/// connections untouched.
#[derive(Clone, Default)]
pub struct HandlerConfig {
    socket_init: Option<SocketInitHandler>,
    tls_init: Option<TlsInitHandler>,
}

impl HandlerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_socket_init(mut self, handler: SocketInitHandler) -> Self {
        self.socket_init = Some(handler);
        self
    }

    pub fn with_tls_init(mut self, handler: TlsInitHandler) -> Self {
        self.tls_init = Some(handler);
        self
    }

    pub fn socket_init(&self) -> Option<&SocketInitHandler> {
        self.socket_init.as_ref()
    }

    pub fn tls_init(&self) -> Option<&TlsInitHandler> {
        self.tls_init.as_ref()
    }
}

impl fmt::Debug for HandlerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerConfig")
            .field("socket_init", &self.socket_init.is_some())
            .field("tls_init", &self.tls_init.is_some())
            .finish()
    }
}
