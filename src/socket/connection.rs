//! Per-connection TLS state machine.
//!
//! A [`Connection`] moves through
//! `Unbound → Bound → HandshakePending → {Established | Failed | TimedOut}
//! → ShuttingDown → Closed`.
//!
//! The handshake and its deadline run as two tasks on the reactor. Whichever
//! resolves first claims the [`CompletionToken`], reports through the
//! caller's callback and aborts the other. A late resolution finds the token
//! already claimed and does nothing.

use super::client::{SocketType, StreamSocket};
use super::completion::{CompletionToken, HandshakeResult};
use super::config::TransportConfig;
use super::handle::ConnectionHandle;
use super::handlers::HandlerConfig;
use super::timer::HandshakeTimer;
use crate::base::context::{handshake_failure, IoResultExt};
use crate::base::error::TransportError;
use boring::ssl::Ssl;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tokio_boring::SslStreamBuilder;

/// Handshake direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Awaits the peer's ClientHello.
    Server,
    /// Sends the ClientHello.
    Client,
}

/// Whether connections wrap their stream in TLS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    #[default]
    Tls,
    Plain,
}

/// Lifecycle state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unbound,
    Bound,
    HandshakePending,
    Established,
    Failed,
    TimedOut,
    ShuttingDown,
    Closed,
}

/// Where the socket currently lives.
enum SocketSlot {
    Unbound,
    /// Bound but not yet handshaking. `ssl` is None for plain connections.
    Bound { stream: TcpStream, ssl: Option<Ssl> },
    /// Owned by the handshake task.
    InFlight,
    Established(SocketType),
    /// Closed after a failure, timeout, handover or shutdown.
    Released,
}

struct Inner {
    state: ConnectionState,
    socket: SocketSlot,
    handshake: Option<AbortHandle>,
}

type Shared = Arc<Mutex<Inner>>;

fn lock(shared: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn transition(inner: &mut Inner, handle: ConnectionHandle, next: ConnectionState) {
    tracing::debug!(connection = %handle, from = ?inner.state, to = ?next, "state transition");
    inner.state = next;
}

/// A transport connection, secure or plain.
pub struct Connection {
    handle: ConnectionHandle,
    security: Security,
    handlers: HandlerConfig,
    config: TransportConfig,
    server_name: Option<String>,
    role: Option<Role>,
    reactor: Option<Handle>,
    timer: Option<HandshakeTimer>,
    shared: Shared,
}

impl Connection {
    /// Create an unbound connection with no hooks and default timing.
    ///
    /// Connections are normally obtained from
    /// [`Endpoint::new_connection`](super::endpoint::Endpoint::new_connection).
    pub fn new(security: Security) -> Self {
        Self {
            handle: ConnectionHandle::next(),
            security,
            handlers: HandlerConfig::default(),
            config: TransportConfig::default(),
            server_name: None,
            role: None,
            reactor: None,
            timer: None,
            shared: Arc::new(Mutex::new(Inner {
                state: ConnectionState::Unbound,
                socket: SocketSlot::Unbound,
                handshake: None,
            })),
        }
    }

    /// Install an endpoint's hook snapshot and timing.
    pub(crate) fn configure(&mut self, handlers: HandlerConfig, config: TransportConfig) {
        self.handlers = handlers;
        self.config = config;
    }

    pub fn handle(&self) -> ConnectionHandle {
        self.handle
    }

    pub fn is_secure(&self) -> bool {
        self.security == Security::Tls
    }

    pub fn state(&self) -> ConnectionState {
        lock(&self.shared).state
    }

    /// Role recorded at bind time.
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn handshake_timeout(&self) -> Duration {
        self.config.handshake_timeout
    }

    pub fn handlers(&self) -> &HandlerConfig {
        &self.handlers
    }

    /// Server name for client connections: sent as SNI and checked against
    /// the peer certificate. Fails with `AlreadyBound` once the TLS session
    /// exists.
    pub fn set_server_name(&mut self, name: impl Into<String>) -> Result<(), TransportError> {
        if self.reactor.is_some() {
            return Err(TransportError::AlreadyBound);
        }
        self.server_name = Some(name.into());
        Ok(())
    }

    /// Bind the connection to a reactor and a freshly accepted or dialed
    /// stream. Must be called exactly once.
    ///
    /// For secure connections the tls-init hook is consulted here; if it is
    /// missing or yields no context, nothing is allocated and the stream is
    /// dropped.
    pub fn bind(
        &mut self,
        reactor: &Handle,
        stream: TcpStream,
        role: Role,
    ) -> Result<(), TransportError> {
        if self.reactor.is_some() {
            return Err(TransportError::AlreadyBound);
        }

        let ssl = match self.security {
            Security::Tls => Some(self.new_session(role)?),
            Security::Plain => None,
        };

        self.timer = Some(HandshakeTimer::new(reactor.clone(), self.config.handshake_timeout));
        self.reactor = Some(reactor.clone());
        self.role = Some(role);

        let mut inner = lock(&self.shared);
        inner.socket = SocketSlot::Bound { stream, ssl };
        transition(&mut inner, self.handle, ConnectionState::Bound);
        Ok(())
    }

    fn new_session(&self, role: Role) -> Result<Ssl, TransportError> {
        let tls_init = self
            .handlers
            .tls_init()
            .ok_or(TransportError::MissingTlsInitHandler)?;
        let context = tls_init(self.handle).ok_or(TransportError::InvalidTlsContext)?;

        let mut ssl = Ssl::new(&context)?;
        if let (Role::Client, Some(name)) = (role, self.server_name.as_deref()) {
            ssl.set_hostname(name)?;
            ssl.param_mut().set_host(name)?;
        }
        Ok(ssl)
    }

    /// Start the handshake race.
    ///
    /// `on_complete` is invoked exactly once, on the reactor, with the first
    /// of: success, `PassThrough(cause)`, or `HandshakeTimeout`. Misuse
    /// (not bound, second attempt) is returned synchronously and the
    /// callback is dropped uncalled.
    pub fn start_handshake<F>(&mut self, on_complete: F) -> Result<(), TransportError>
    where
        F: FnOnce(HandshakeResult) + Send + 'static,
    {
        let (Some(reactor), Some(role), Some(timer)) =
            (self.reactor.clone(), self.role, self.timer.as_mut())
        else {
            return Err(TransportError::NotBound);
        };
        let handle = self.handle;

        let (stream, ssl) = {
            let mut inner = lock(&self.shared);
            match std::mem::replace(&mut inner.socket, SocketSlot::InFlight) {
                SocketSlot::Bound { stream, ssl } => {
                    transition(&mut inner, handle, ConnectionState::HandshakePending);
                    (stream, ssl)
                }
                other => {
                    inner.socket = other;
                    return Err(TransportError::HandshakeAlreadyStarted);
                }
            }
        };

        if let Some(socket_init) = self.handlers.socket_init() {
            socket_init(handle, &stream);
        }

        let token = CompletionToken::new(on_complete);

        let timer_abort = timer.arm({
            let token = token.clone();
            let shared = self.shared.clone();
            move || on_deadline(handle, &token, &shared)
        });

        let task = reactor.spawn(drive_handshake(
            handle,
            stream,
            ssl,
            role,
            token,
            timer_abort,
            self.shared.clone(),
        ));

        let mut inner = lock(&self.shared);
        if inner.state == ConnectionState::TimedOut {
            task.abort();
        } else {
            inner.handshake = Some(task.abort_handle());
        }
        Ok(())
    }

    /// Run the handshake race and await its outcome.
    pub async fn handshake(&mut self) -> HandshakeResult {
        let (tx, rx) = oneshot::channel();
        self.start_handshake(move |result| {
            let _ = tx.send(result);
        })?;
        rx.await.unwrap_or_else(|_| {
            Err(TransportError::PassThrough(io::Error::new(
                io::ErrorKind::ConnectionAborted,
                "handshake abandoned",
            )))
        })
    }

    /// Access the lowest transport layer, e.g. to set socket options.
    pub fn with_raw_socket<R>(&self, f: impl FnOnce(&TcpStream) -> R) -> Result<R, TransportError> {
        let inner = lock(&self.shared);
        match &inner.socket {
            SocketSlot::Unbound => Err(TransportError::NotBound),
            SocketSlot::Bound { stream, .. } => Ok(f(stream)),
            SocketSlot::InFlight => Err(TransportError::HandshakeInProgress),
            SocketSlot::Established(socket) => Ok(f(socket.tcp())),
            SocketSlot::Released => Err(TransportError::NotEstablished),
        }
    }

    /// Access the established (possibly TLS-wrapped) stream.
    pub fn with_socket<R>(
        &self,
        f: impl FnOnce(&mut SocketType) -> R,
    ) -> Result<R, TransportError> {
        let mut inner = lock(&self.shared);
        match &mut inner.socket {
            SocketSlot::Unbound => Err(TransportError::NotBound),
            SocketSlot::InFlight => Err(TransportError::HandshakeInProgress),
            SocketSlot::Established(socket) => Ok(f(socket)),
            SocketSlot::Bound { .. } | SocketSlot::Released => Err(TransportError::NotEstablished),
        }
    }

    /// Hand the established stream to the protocol engine.
    pub fn into_stream(self) -> Result<SocketType, TransportError> {
        let mut inner = lock(&self.shared);
        match std::mem::replace(&mut inner.socket, SocketSlot::Released) {
            SocketSlot::Established(socket) => Ok(socket),
            other => {
                let err = match other {
                    SocketSlot::Unbound => TransportError::NotBound,
                    SocketSlot::InFlight => TransportError::HandshakeInProgress,
                    _ => TransportError::NotEstablished,
                };
                inner.socket = other;
                Err(err)
            }
        }
    }

    /// Gracefully close the session.
    ///
    /// Sends close_notify on established TLS streams, bounded by the shutdown
    /// timeout. Close failures are returned as the non-fatal
    /// [`TransportError::Shutdown`]; the connection is `Closed` either way.
    pub async fn shutdown(&mut self) -> Result<(), TransportError> {
        let socket = {
            let mut inner = lock(&self.shared);
            match std::mem::replace(&mut inner.socket, SocketSlot::Released) {
                SocketSlot::Unbound => {
                    inner.socket = SocketSlot::Unbound;
                    return Err(TransportError::NotBound);
                }
                SocketSlot::InFlight => {
                    inner.socket = SocketSlot::InFlight;
                    return Err(TransportError::HandshakeInProgress);
                }
                SocketSlot::Established(socket) => {
                    transition(&mut inner, self.handle, ConnectionState::ShuttingDown);
                    Some(socket)
                }
                SocketSlot::Bound { .. } | SocketSlot::Released => None,
            }
        };

        if let Some(timer) = self.timer.as_mut() {
            timer.cancel();
        }

        let result = match socket {
            Some(mut socket) => {
                match tokio::time::timeout(self.config.shutdown_timeout, socket.shutdown()).await {
                    Ok(closed) => closed.shutdown_context(),
                    Err(_) => Err(TransportError::Shutdown(io::Error::new(
                        io::ErrorKind::TimedOut,
                        "close_notify timed out",
                    ))),
                }
            }
            None => Ok(()),
        };

        if let Err(e) = &result {
            tracing::warn!(connection = %self.handle, error = %e, "shutdown failed");
        }
        transition(&mut lock(&self.shared), self.handle, ConnectionState::Closed);
        result
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("handle", &self.handle)
            .field("security", &self.security)
            .field("role", &self.role)
            .field("state", &self.state())
            .finish()
    }
}

/// Timer expiry: report the timeout and tear down the in-flight handshake.
fn on_deadline(handle: ConnectionHandle, token: &CompletionToken, shared: &Mutex<Inner>) {
    if !token.try_claim() {
        return;
    }
    {
        let mut inner = lock(shared);
        if let Some(task) = inner.handshake.take() {
            task.abort();
        }
        inner.socket = SocketSlot::Released;
        transition(&mut inner, handle, ConnectionState::TimedOut);
    }
    tracing::debug!(connection = %handle, "handshake timed out");
    token.deliver(Err(TransportError::HandshakeTimeout));
}

async fn drive_handshake(
    handle: ConnectionHandle,
    stream: TcpStream,
    ssl: Option<Ssl>,
    role: Role,
    token: CompletionToken,
    timer: AbortHandle,
    shared: Shared,
) {
    let outcome = match ssl {
        Some(ssl) => {
            let builder = SslStreamBuilder::new(ssl, stream);
            let result = match role {
                Role::Server => builder.accept().await,
                Role::Client => builder.connect().await,
            };
            result.map(SocketType::Ssl).map_err(handshake_failure)
        }
        None => Ok(SocketType::Tcp(stream)),
    };

    // Aborting an already-finished timer is a no-op.
    timer.abort();

    if !token.try_claim() {
        tracing::trace!(connection = %handle, "late handshake resolution ignored");
        return;
    }

    let result = {
        let mut inner = lock(&shared);
        inner.handshake = None;
        match outcome {
            Ok(socket) => {
                inner.socket = SocketSlot::Established(socket);
                transition(&mut inner, handle, ConnectionState::Established);
                Ok(())
            }
            Err(e) => {
                tracing::debug!(connection = %handle, error = %e, "handshake failed");
                inner.socket = SocketSlot::Released;
                transition(&mut inner, handle, ConnectionState::Failed);
                Err(e)
            }
        }
    };
    token.deliver(result);
}
