use std::io;
use thiserror::Error;

/// Errors surfaced by the secure transport.
///
/// Synchronous misuse (`bind`, `start_handshake`, accessors) is returned
/// directly. Asynchronous handshake outcomes arrive through the completion
/// callback as either [`TransportError::HandshakeTimeout`] or
/// [`TransportError::PassThrough`].
#[derive(Debug, Error)]
pub enum TransportError {
    // Binding Errors
    #[error("No TLS init handler configured")]
    MissingTlsInitHandler,
    #[error("TLS init handler returned no context")]
    InvalidTlsContext,
    #[error("Connection already bound")]
    AlreadyBound,
    #[error("Connection not bound")]
    NotBound,

    // Handshake Errors
    #[error("TLS handshake timed out")]
    HandshakeTimeout,
    #[error("Handshake already started")]
    HandshakeAlreadyStarted,
    #[error("Handshake in progress")]
    HandshakeInProgress,
    #[error("Connection not established")]
    NotEstablished,
    #[error("Transport error: {0}")]
    PassThrough(#[source] io::Error),

    // Teardown
    #[error("Shutdown failed: {0}")]
    Shutdown(#[source] io::Error),

    // Configuration
    #[error("Timeout must be greater than zero")]
    InvalidTimeout,
    #[error("TLS configuration error: {0}")]
    Tls(#[from] boring::error::ErrorStack),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    pub fn as_i32(&self) -> i32 {
        match self {
            TransportError::MissingTlsInitHandler => -100,
            TransportError::InvalidTlsContext => -101,
            TransportError::AlreadyBound => -102,
            TransportError::NotBound => -103,
            TransportError::HandshakeTimeout => -110,
            TransportError::HandshakeAlreadyStarted => -111,
            TransportError::HandshakeInProgress => -112,
            TransportError::NotEstablished => -113,
            TransportError::PassThrough(_) => -114,
            TransportError::Shutdown(_) => -120,
            TransportError::InvalidTimeout => -130,
            TransportError::Tls(_) => -131,
            TransportError::Io(_) => -132,
        }
    }

    /// Returns true if the error ends the connection.
    ///
    /// Shutdown failures are reported for visibility only: the session is
    /// torn down regardless.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TransportError::Shutdown(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::HandshakeTimeout)
    }

    /// Returns true for errors raised by calling an operation in the wrong
    /// lifecycle phase.
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            TransportError::AlreadyBound
                | TransportError::NotBound
                | TransportError::HandshakeAlreadyStarted
                | TransportError::HandshakeInProgress
                | TransportError::NotEstablished
        )
    }
}
