//! DID method drivers.
//!
//! Each driver turns a parsed DID of one method into a DID Document. The
//! self-contained methods (`did:key`, `did:jwk`) accept key handlers that are
//! registered once per key type; registering the same key type twice is
//! reported when the driver is built.

mod jwk;
mod key;
mod web;

pub use jwk::{DidJwkDriver, DidJwkDriverBuilder};
pub use key::{DidKeyDriver, DidKeyDriverBuilder};
pub use web::DidWebDriver;

use async_trait::async_trait;
use base58::{FromBase58, ToBase58};
use serde_json::{json, Value};

use crate::contexts::{DID_V1_URL, ED25519_2020_URL, MULTIKEY_V1_URL};
use crate::did::Did;
use crate::error::ResolutionError;
use crate::types::{DIDDocument, VerificationMethod};

// Multicodec prefixes (unsigned varint encoded)
const ED25519_PUB: [u8; 2] = [0xed, 0x01];
const P256_PUB: [u8; 2] = [0x80, 0x24];

/// Resolves DIDs of a single method
#[async_trait]
pub trait DidMethodDriver: Send + Sync {
    /// The method name this driver handles, e.g. `key`
    fn method(&self) -> &str;

    /// Produces the DID Document for `did`
    async fn resolve(&self, did: &Did) -> Result<DIDDocument, ResolutionError>;
}

/// Public key types understood by the self-contained methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Ed25519,
    P256,
}

impl KeyType {
    /// Leading characters of a base58btc multikey of this type
    pub fn multibase_header(&self) -> &'static str {
        match self {
            KeyType::Ed25519 => "z6Mk",
            KeyType::P256 => "zDna",
        }
    }

    fn codec(&self) -> [u8; 2] {
        match self {
            KeyType::Ed25519 => ED25519_PUB,
            KeyType::P256 => P256_PUB,
        }
    }

    /// Raw key length; P-256 keys are compressed points
    fn key_length(&self) -> usize {
        match self {
            KeyType::Ed25519 => 32,
            KeyType::P256 => 33,
        }
    }
}

/// Verification method representations a handler can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationSuite {
    Ed25519VerificationKey2020,
    Multikey,
}

impl VerificationSuite {
    /// Value of the verification method's `type`
    pub fn type_name(&self) -> &'static str {
        match self {
            VerificationSuite::Ed25519VerificationKey2020 => "Ed25519VerificationKey2020",
            VerificationSuite::Multikey => "Multikey",
        }
    }

    /// Context the DID document needs for this suite
    pub fn context_url(&self) -> &'static str {
        match self {
            VerificationSuite::Ed25519VerificationKey2020 => ED25519_2020_URL,
            VerificationSuite::Multikey => MULTIKEY_V1_URL,
        }
    }
}

/// Binds a key type to the verification method representation it produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyHandler {
    pub key_type: KeyType,
    pub suite: VerificationSuite,
}

impl KeyHandler {
    /// Ed25519 keys as `Ed25519VerificationKey2020`
    pub fn ed25519_2020() -> Self {
        Self {
            key_type: KeyType::Ed25519,
            suite: VerificationSuite::Ed25519VerificationKey2020,
        }
    }

    /// P-256 keys as ECDSA `Multikey`
    pub fn ecdsa_multikey() -> Self {
        Self {
            key_type: KeyType::P256,
            suite: VerificationSuite::Multikey,
        }
    }

    /// Builds the verification method for `key`, which must be raw public
    /// key bytes of this handler's key type.
    fn verification_method(
        &self,
        controller: &str,
        id: String,
        key: &[u8],
    ) -> Result<VerificationMethod, ResolutionError> {
        Ok(VerificationMethod {
            id,
            method_type: self.suite.type_name().to_string(),
            controller: controller.to_string(),
            public_key_multibase: Some(encode_multikey(self.key_type, key)?),
            public_key_jwk: None,
        })
    }

    fn document_context(&self) -> Value {
        json!([DID_V1_URL, self.suite.context_url()])
    }
}

/// Encodes raw public key bytes as a base58btc multikey
pub fn encode_multikey(key_type: KeyType, key: &[u8]) -> Result<String, ResolutionError> {
    if key.len() != key_type.key_length() {
        return Err(ResolutionError::InvalidKey(format!(
            "{:?} key must be {} bytes, got {}",
            key_type,
            key_type.key_length(),
            key.len()
        )));
    }
    let mut bytes = key_type.codec().to_vec();
    bytes.extend_from_slice(key);
    Ok(format!("z{}", bytes.to_base58()))
}

/// Decodes a base58btc multikey into its key type and raw key bytes
pub fn decode_multikey(multibase: &str) -> Result<(KeyType, Vec<u8>), ResolutionError> {
    let encoded = multibase.strip_prefix('z').ok_or_else(|| {
        ResolutionError::InvalidKey(format!("{} is not base58btc multibase", multibase))
    })?;
    let bytes = encoded
        .from_base58()
        .map_err(|e| ResolutionError::InvalidKey(format!("base58 decoding failed: {:?}", e)))?;

    let key_type = [KeyType::Ed25519, KeyType::P256]
        .into_iter()
        .find(|t| bytes.starts_with(&t.codec()))
        .ok_or_else(|| ResolutionError::InvalidKey("unknown multicodec prefix".to_string()))?;

    let key = bytes[2..].to_vec();
    if key.len() != key_type.key_length() {
        return Err(ResolutionError::InvalidKey(format!(
            "{:?} key must be {} bytes, got {}",
            key_type,
            key_type.key_length(),
            key.len()
        )));
    }
    Ok((key_type, key))
}

/// Collects handlers keyed by a string slot and rejects duplicates
#[derive(Debug, Clone)]
struct HandlerRegistry<H> {
    method: &'static str,
    handlers: Vec<(String, H)>,
}

impl<H> HandlerRegistry<H> {
    fn new(method: &'static str) -> Self {
        Self {
            method,
            handlers: Vec::new(),
        }
    }

    fn push(&mut self, slot: impl Into<String>, handler: H) {
        self.handlers.push((slot.into(), handler));
    }

    fn build(self) -> Result<Vec<(String, H)>, ResolutionError> {
        for (i, (slot, _)) in self.handlers.iter().enumerate() {
            if self.handlers[..i].iter().any(|(seen, _)| seen == slot) {
                return Err(ResolutionError::DuplicateDriverRegistration {
                    method: self.method.to_string(),
                    key_type: slot.clone(),
                });
            }
        }
        Ok(self.handlers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multikey_headers() {
        let ed = encode_multikey(KeyType::Ed25519, &[7u8; 32]).unwrap();
        assert!(ed.starts_with(KeyType::Ed25519.multibase_header()));

        let mut p256 = vec![0x02];
        p256.extend_from_slice(&[9u8; 32]);
        let p = encode_multikey(KeyType::P256, &p256).unwrap();
        assert!(p.starts_with("zDn"));
    }

    #[test]
    fn test_decode_multikey() {
        let encoded = encode_multikey(KeyType::Ed25519, &[1u8; 32]).unwrap();
        let (key_type, key) = decode_multikey(&encoded).unwrap();
        assert_eq!(key_type, KeyType::Ed25519);
        assert_eq!(key, vec![1u8; 32]);
    }

    #[test]
    fn test_decode_rejects_bad_material() {
        assert!(matches!(decode_multikey("6Mkabc"), Err(ResolutionError::InvalidKey(_))));
        assert!(matches!(decode_multikey("z0OIl"), Err(ResolutionError::InvalidKey(_))));

        let unknown = format!("z{}", [0x12u8, 0x20, 1, 2, 3].to_base58());
        assert!(matches!(decode_multikey(&unknown), Err(ResolutionError::InvalidKey(_))));

        let short = format!("z{}", [0xedu8, 0x01, 1, 2, 3].to_base58());
        assert!(matches!(decode_multikey(&short), Err(ResolutionError::InvalidKey(_))));
    }

    #[test]
    fn test_registry_rejects_duplicate_slot() {
        let mut registry = HandlerRegistry::new("key");
        registry.push("z6Mk", 1);
        registry.push("zDna", 2);
        registry.push("z6Mk", 3);

        assert!(matches!(
            registry.build(),
            Err(ResolutionError::DuplicateDriverRegistration { method, key_type })
                if method == "key" && key_type == "z6Mk"
        ));
    }
}
