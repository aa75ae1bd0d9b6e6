//! TLS context construction.
//!
//! The transport never builds contexts on its own: applications return one
//! from the tls-init hook. [`TlsConfig`] is the usual way to produce it.

pub mod cert;
pub mod config;

pub use cert::{self_signed, Identity};
pub use config::TlsConfig;
