//! Shared fixtures for transport integration tests.
#![allow(dead_code)]

use boring::ssl::SslContext;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tlsgate::socket::HandshakeResult;
use tlsgate::tls::{self_signed, Identity, TlsConfig};
use tlsgate::{Endpoint, TransportError};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;

/// Connected loopback pair: (dialed side, accepted side).
pub async fn tcp_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (dialed, accepted) = tokio::join!(TcpStream::connect(addr), listener.accept());
    (dialed.unwrap(), accepted.unwrap().0)
}

pub fn identity() -> Identity {
    self_signed("localhost", 1).unwrap()
}

pub fn server_context(identity: &Identity) -> SslContext {
    TlsConfig::default_server(identity.clone())
        .with_alpn(&["http/1.1"])
        .build_server_context()
        .unwrap()
}

/// Client context that skips chain verification.
pub fn insecure_client_context() -> SslContext {
    TlsConfig::default_client()
        .with_verify_peer(false)
        .with_alpn(&["http/1.1"])
        .build_client_context()
        .unwrap()
}

pub fn secure_endpoint(context: SslContext, timeout: Duration) -> Endpoint {
    let mut endpoint = Endpoint::secure();
    endpoint.set_tls_init_handler(move |_| Some(context.clone()));
    endpoint.set_handshake_timeout(timeout).unwrap();
    endpoint
}

/// Records every invocation of a completion callback.
#[derive(Clone, Default)]
pub struct Outcomes {
    results: Arc<Mutex<Vec<HandshakeResult>>>,
    notify: Arc<Notify>,
}

impl Outcomes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callback(&self) -> impl FnOnce(HandshakeResult) + Send + 'static {
        let results = self.results.clone();
        let notify = self.notify.clone();
        move |result| {
            results.lock().unwrap().push(result);
            notify.notify_one();
        }
    }

    pub fn count(&self) -> usize {
        self.results.lock().unwrap().len()
    }

    /// Wait until at least one outcome arrived, then report its error code
    /// (0 for success).
    pub async fn first(&self) -> i32 {
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let first = self.results.lock().unwrap().first().map(|result| match result {
                    Ok(()) => OK,
                    Err(e) => e.as_i32(),
                });
                if let Some(code) = first {
                    return code;
                }
                self.notify.notified().await;
            }
        })
        .await
        .expect("no handshake outcome within 10s")
    }
}

pub const OK: i32 = 0;

pub fn timeout_code() -> i32 {
    TransportError::HandshakeTimeout.as_i32()
}

pub fn pass_through_code() -> i32 {
    TransportError::PassThrough(std::io::Error::other("")).as_i32()
}
