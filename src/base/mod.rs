//! Base types and error handling.
//!
//! - [`TransportError`](error::TransportError): the crate-wide error taxonomy
//! - [`context`]: helpers that normalize IO and TLS failures

pub mod context;
pub mod error;
