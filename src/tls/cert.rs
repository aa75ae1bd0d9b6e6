//! Certificate material.

use crate::base::error::TransportError;
use boring::asn1::Asn1Time;
use boring::bn::BigNum;
use boring::ec::{EcGroup, EcKey};
use boring::hash::MessageDigest;
use boring::nid::Nid;
use boring::pkey::{PKey, Private};
use boring::x509::{X509NameBuilder, X509};
use std::io;
use std::path::Path;

/// A certificate chain and its private key.
#[derive(Clone)]
pub struct Identity {
    /// Leaf first, followed by intermediates. Never empty.
    chain: Vec<X509>,
    key: PKey<Private>,
}

impl Identity {
    /// Pair a chain (leaf first) with its key. The chain must not be empty.
    pub fn new(chain: Vec<X509>, key: PKey<Private>) -> Result<Self, TransportError> {
        if chain.is_empty() {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "no certificate in chain",
            )));
        }
        Ok(Self { chain, key })
    }

    /// Parse a PEM certificate chain and PEM private key.
    pub fn from_pem(chain_pem: &[u8], key_pem: &[u8]) -> Result<Self, TransportError> {
        let chain = X509::stack_from_pem(chain_pem)?;
        let key = PKey::private_key_from_pem(key_pem)?;
        Self::new(chain, key)
    }

    /// Load a PEM certificate chain and private key from disk.
    pub fn from_pem_files(
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
    ) -> Result<Self, TransportError> {
        let chain_pem = std::fs::read(cert_path)?;
        let key_pem = std::fs::read(key_path)?;
        Self::from_pem(&chain_pem, &key_pem)
    }

    pub fn leaf(&self) -> &X509 {
        &self.chain[0]
    }

    pub fn chain(&self) -> &[X509] {
        &self.chain
    }

    pub fn key(&self) -> &PKey<Private> {
        &self.key
    }

    pub fn chain_pem(&self) -> Result<Vec<u8>, TransportError> {
        let mut pem = Vec::new();
        for cert in &self.chain {
            pem.extend_from_slice(&cert.to_pem()?);
        }
        Ok(pem)
    }

    pub fn key_pem(&self) -> Result<Vec<u8>, TransportError> {
        Ok(self.key.private_key_to_pem_pkcs8()?)
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("chain_len", &self.chain.len())
            .finish_non_exhaustive()
    }
}

/// Generate a self-signed P-256 identity for `common_name`, valid for
/// `days` days. Intended for local testing.
pub fn self_signed(common_name: &str, days: u32) -> Result<Identity, TransportError> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1)?;
    let key = PKey::from_ec_key(EcKey::generate(&group)?)?;

    let mut name = X509NameBuilder::new()?;
    name.append_entry_by_text("CN", common_name)?;
    let name = name.build();

    let mut builder = X509::builder()?;
    builder.set_version(2)?;
    let serial = BigNum::from_u32(1)?.to_asn1_integer()?;
    builder.set_serial_number(&serial)?;
    builder.set_subject_name(&name)?;
    builder.set_issuer_name(&name)?;
    builder.set_pubkey(&key)?;
    let not_before = Asn1Time::days_from_now(0)?;
    builder.set_not_before(&not_before)?;
    let not_after = Asn1Time::days_from_now(days)?;
    builder.set_not_after(&not_after)?;
    builder.sign(&key, MessageDigest::sha256())?;

    Identity::new(vec![builder.build()], key)
}
