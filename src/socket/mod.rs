//! Connection establishment.
//!
//! - [`endpoint`]: factory propagating application hooks into connections
//! - [`connection`]: per-connection bind / handshake / shutdown state machine
//! - [`completion`]: at-most-once outcome delivery
//! - [`timer`]: handshake deadline
//! - [`client`]: established stream types

pub mod client;
pub mod completion;
pub mod config;
pub mod connection;
pub mod endpoint;
pub mod handle;
pub mod handlers;
pub mod timer;

pub use client::{SocketType, StreamSocket};
pub use completion::{CompletionToken, HandshakeResult};
pub use config::TransportConfig;
pub use connection::{Connection, ConnectionState, Role, Security};
pub use endpoint::Endpoint;
pub use handle::ConnectionHandle;
pub use handlers::{HandlerConfig, SocketInitHandler, TlsInitHandler};
