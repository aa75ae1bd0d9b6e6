//! # tlsgate
//!
//! Secure transport policy for asynchronous protocol engines.
//!
//! `tlsgate` wraps an accepted or dialed `TcpStream` in a BoringSSL session
//! and reports the outcome of the handshake exactly once. The handshake
//! races a deadline timer; whichever resolves first decides the result and
//! the other is cancelled.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tlsgate::socket::{Endpoint, Role};
//! use tlsgate::tls::{self_signed, TlsConfig};
//!
//! let context = TlsConfig::default_server(self_signed("localhost", 30)?)
//!     .build_server_context()?;
//!
//! let mut endpoint = Endpoint::secure();
//! endpoint.set_tls_init_handler(move |_| Some(context.clone()));
//! endpoint.set_socket_init_handler(|_, tcp| {
//!     let _ = tcp.set_nodelay(true);
//! });
//!
//! let (stream, _) = listener.accept().await?;
//! let mut conn = endpoint.new_connection();
//! conn.bind(&tokio::runtime::Handle::current(), stream, Role::Server)?;
//! conn.handshake().await?;
//! let stream = conn.into_stream()?;
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error taxonomy and context helpers
//! - [`socket`] - Endpoint, connection state machine and handshake race
//! - [`tls`] - BoringSSL context construction and certificate material

pub mod base;
pub mod socket;
pub mod tls;

pub use base::error::TransportError;
pub use socket::{Connection, ConnectionHandle, ConnectionState, Endpoint, Role, Security};
