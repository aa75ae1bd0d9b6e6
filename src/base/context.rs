//! Ergonomic error context helpers.
//!
//! Provides extension traits for normalizing lower-layer failures into
//! `TransportError` variants.

use crate::base::error::TransportError;
use std::fmt;
use std::io;

/// Extension trait for classifying IO Results.
pub trait IoResultExt<T> {
    /// Forward an IO error as a pass-through handshake failure.
    ///
    /// # Example
    /// ```ignore
    /// use tlsgate::base::context::IoResultExt;
    ///
    /// stream.set_nodelay(true).pass_through()?;
    /// ```
    fn pass_through(self) -> Result<T, TransportError>;

    /// Wrap an IO error as a non-fatal shutdown failure.
    fn shutdown_context(self) -> Result<T, TransportError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn pass_through(self) -> Result<T, TransportError> {
        self.map_err(TransportError::PassThrough)
    }

    fn shutdown_context(self) -> Result<T, TransportError> {
        self.map_err(TransportError::Shutdown)
    }
}

/// Normalize a handshake failure into a pass-through error.
///
/// Transport failures keep the underlying IO error; TLS protocol failures
/// (alerts, malformed records, verification) are reported as `InvalidData`.
pub fn handshake_failure<S: fmt::Debug>(err: tokio_boring::HandshakeError<S>) -> TransportError {
    let cause = match err.as_io_error() {
        Some(io) => io_cause(io),
        None => io::Error::new(io::ErrorKind::InvalidData, err.to_string()),
    };
    TransportError::PassThrough(cause)
}

/// Recover an owned copy of a borrowed IO error.
///
/// OS errors are rebuilt from their errno, so code, kind and message match
/// the original exactly.
fn io_cause(err: &io::Error) -> io::Error {
    match err.raw_os_error() {
        Some(code) => io::Error::from_raw_os_error(code),
        None => io::Error::new(err.kind(), err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_pass_through() {
        let result: Result<(), io::Error> = Err(Error::new(ErrorKind::ConnectionReset, "reset"));
        let err = result.pass_through().unwrap_err();

        match err {
            TransportError::PassThrough(cause) => {
                assert_eq!(cause.kind(), ErrorKind::ConnectionReset);
            }
            _ => panic!("Expected PassThrough"),
        }
    }

    #[test]
    fn test_io_cause_keeps_os_error() {
        let original = std::fs::File::open("/nonexistent/tlsgate/cert.pem").unwrap_err();
        let cause = io_cause(&original);

        assert!(original.raw_os_error().is_some());
        assert_eq!(cause.raw_os_error(), original.raw_os_error());
        assert_eq!(cause.kind(), ErrorKind::NotFound);
        assert_eq!(cause.to_string(), original.to_string());
    }

    #[test]
    fn test_io_cause_keeps_custom_kind() {
        let original = Error::new(ErrorKind::UnexpectedEof, "peer closed");
        let cause = io_cause(&original);

        assert_eq!(cause.kind(), ErrorKind::UnexpectedEof);
        assert_eq!(cause.to_string(), "peer closed");
    }

    #[test]
    fn test_shutdown_context() {
        let result: Result<(), io::Error> = Err(Error::new(ErrorKind::BrokenPipe, "pipe"));
        let err = result.shutdown_context().unwrap_err();

        assert!(matches!(err, TransportError::Shutdown(_)));
        assert!(!err.is_fatal());
    }
}
