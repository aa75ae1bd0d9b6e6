use boring::ssl::SslVersion;
use tlsgate::tls::{self_signed, Identity, TlsConfig};

#[test]
fn test_default_client_config() {
    let config = TlsConfig::default_client();

    assert_eq!(config.min_version, Some(SslVersion::TLS1_2));
    assert_eq!(config.max_version, Some(SslVersion::TLS1_3));
    assert!(config.verify_peer);
    assert!(config.alpn_protos.is_empty());

    let result = config.build_client_context();
    assert!(result.is_ok(), "Failed to build default client context");
}

#[test]
fn test_server_context_from_pem() {
    let generated = self_signed("localhost", 7).unwrap();
    let identity = Identity::from_pem(
        &generated.chain_pem().unwrap(),
        &generated.key_pem().unwrap(),
    )
    .unwrap();

    let config = TlsConfig::default_server(identity).with_alpn(&["http/1.1"]);
    assert!(!config.verify_peer);
    assert!(config.build_server_context().is_ok());
}

#[test]
fn test_mismatched_key_rejected() {
    let first = self_signed("localhost", 1).unwrap();
    let second = self_signed("localhost", 1).unwrap();
    let mismatched = Identity::new(first.chain().to_vec(), second.key().clone()).unwrap();

    let config = TlsConfig::default_server(mismatched);
    assert!(config.build_server_context().is_err());
}

#[test]
fn test_mutual_tls_server_context() {
    let identity = self_signed("localhost", 1).unwrap();
    let client_ca = self_signed("client-ca", 1).unwrap();

    let config = TlsConfig::default_server(identity)
        .with_verify_peer(true)
        .with_trust_anchor(client_ca.leaf().clone());
    assert!(config.build_server_context().is_ok());
}
