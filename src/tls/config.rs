use super::cert::Identity;
use crate::base::error::TransportError;
use boring::ssl::{
    select_next_proto, AlpnError, SslContext, SslContextBuilder, SslMethod, SslVerifyMode,
    SslVersion,
};
use boring::x509::X509;
use std::io;

/// Configuration for building BoringSSL contexts handed out by tls-init hooks.
///
/// Contexts are immutable once built and may be shared by any number of
/// connections.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub min_version: Option<SslVersion>,
    pub max_version: Option<SslVersion>,
    pub cipher_list: Option<String>,
    pub curves: Vec<String>,
    pub sigalgs: Option<String>,
    pub alpn_protos: Vec<String>,
    /// Clients verify the server chain; servers require a client certificate.
    pub verify_peer: bool,
    /// Own certificate chain and key. Required for servers.
    pub identity: Option<Identity>,
    /// Trust anchors. When empty and `verify_peer` is set, system roots are used.
    pub trust_anchors: Vec<X509>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self::default_client()
    }
}

impl TlsConfig {
    /// Client defaults: TLS 1.2+, verified peer, no ALPN.
    pub fn default_client() -> Self {
        Self {
            min_version: Some(SslVersion::TLS1_2),
            max_version: Some(SslVersion::TLS1_3),
            cipher_list: Some(
                "ECDHE-ECDSA-AES128-GCM-SHA256:ECDHE-RSA-AES128-GCM-SHA256:\
                ECDHE-ECDSA-AES256-GCM-SHA384:ECDHE-RSA-AES256-GCM-SHA384:\
                ECDHE-ECDSA-CHACHA20-POLY1305:ECDHE-RSA-CHACHA20-POLY1305"
                    .to_string(),
            ),
            curves: vec!["X25519".to_string(), "P-256".to_string(), "P-384".to_string()],
            sigalgs: None,
            alpn_protos: Vec::new(),
            verify_peer: true,
            identity: None,
            trust_anchors: Vec::new(),
        }
    }

    /// Server defaults: same protocol policy, no client certificates.
    pub fn default_server(identity: Identity) -> Self {
        Self {
            verify_peer: false,
            identity: Some(identity),
            ..Self::default_client()
        }
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_trust_anchor(mut self, cert: X509) -> Self {
        self.trust_anchors.push(cert);
        self
    }

    pub fn with_verify_peer(mut self, verify: bool) -> Self {
        self.verify_peer = verify;
        self
    }

    pub fn with_alpn(mut self, protocols: &[&str]) -> Self {
        self.alpn_protos = protocols.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Build a context for the server role.
    pub fn build_server_context(&self) -> Result<SslContext, TransportError> {
        if self.identity.is_none() {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "server context requires a certificate",
            )));
        }
        let mut builder = self.base_builder()?;

        let mode = if self.verify_peer {
            SslVerifyMode::PEER | SslVerifyMode::FAIL_IF_NO_PEER_CERT
        } else {
            SslVerifyMode::NONE
        };
        builder.set_verify(mode);

        if !self.alpn_protos.is_empty() {
            let offered = self.alpn_wire()?;
            builder.set_alpn_select_callback(move |_, client| {
                select_next_proto(&offered, client).ok_or(AlpnError::NOACK)
            });
        }

        Ok(builder.build())
    }

    /// Build a context for the client role.
    pub fn build_client_context(&self) -> Result<SslContext, TransportError> {
        let mut builder = self.base_builder()?;

        builder.set_verify(if self.verify_peer {
            SslVerifyMode::PEER
        } else {
            SslVerifyMode::NONE
        });

        if !self.alpn_protos.is_empty() {
            builder.set_alpn_protos(&self.alpn_wire()?)?;
        }

        Ok(builder.build())
    }

    fn base_builder(&self) -> Result<SslContextBuilder, TransportError> {
        let mut builder = SslContextBuilder::new(SslMethod::tls())?;

        builder.set_min_proto_version(self.min_version)?;
        builder.set_max_proto_version(self.max_version)?;

        if let Some(ciphers) = &self.cipher_list {
            builder.set_cipher_list(ciphers)?;
        }
        if !self.curves.is_empty() {
            builder.set_curves_list(&self.curves.join(":"))?;
        }
        if let Some(sigalgs) = &self.sigalgs {
            builder.set_sigalgs_list(sigalgs)?;
        }

        if let Some(identity) = &self.identity {
            builder.set_certificate(identity.leaf())?;
            for cert in &identity.chain()[1..] {
                builder.add_extra_chain_cert(cert.clone())?;
            }
            builder.set_private_key(identity.key())?;
            builder.check_private_key()?;
        }

        if self.trust_anchors.is_empty() {
            if self.verify_peer {
                builder.set_default_verify_paths()?;
            }
        } else {
            for anchor in &self.trust_anchors {
                builder.cert_store_mut().add_cert(anchor.clone())?;
            }
        }

        Ok(builder)
    }

    /// Length-prefixed ALPN wire format.
    fn alpn_wire(&self) -> Result<Vec<u8>, TransportError> {
        let mut wire = Vec::new();
        for proto in &self.alpn_protos {
            if proto.is_empty() || proto.len() > 255 {
                return Err(TransportError::Io(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("invalid ALPN protocol: {:?}", proto),
                )));
            }
            wire.push(proto.len() as u8);
            wire.extend_from_slice(proto.as_bytes());
        }
        Ok(wire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tls::self_signed;

    #[test]
    fn test_client_context_builds() {
        let config = TlsConfig::default_client().with_alpn(&["http/1.1"]);
        assert!(config.build_client_context().is_ok());
    }

    #[test]
    fn test_server_requires_identity() {
        let config = TlsConfig::default_client();
        assert!(matches!(config.build_server_context(), Err(TransportError::Io(_))));

        let identity = self_signed("localhost", 1).unwrap();
        let config = TlsConfig::default_server(identity).with_alpn(&["http/1.1"]);
        assert!(config.build_server_context().is_ok());
    }

    #[test]
    fn test_alpn_wire_format() {
        let config = TlsConfig::default_client().with_alpn(&["h2", "http/1.1"]);
        assert_eq!(config.alpn_wire().unwrap(), b"\x02h2\x08http/1.1".to_vec());

        let oversized = TlsConfig::default_client().with_alpn(&[&"x".repeat(256)]);
        assert!(oversized.alpn_wire().is_err());
    }

    #[test]
    fn test_bad_cipher_list_rejected() {
        let mut config = TlsConfig::default_client();
        config.cipher_list = Some("NOT-A-CIPHER".to_string());
        assert!(matches!(config.build_client_context(), Err(TransportError::Tls(_))));
    }
}
