//! `did:jwk` resolution.
//!
//! The method-specific identifier is a base64url encoded public JWK. Keys are
//! converted to multikey form by the handler registered for their algorithm.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

use super::{DidMethodDriver, HandlerRegistry, KeyHandler, KeyType};
use crate::did::Did;
use crate::error::ResolutionError;
use crate::types::DIDDocument;

/// Driver for `did:jwk`
#[derive(Debug, Clone)]
pub struct DidJwkDriver {
    handlers: Vec<(String, KeyHandler)>,
}

/// Public JWK fields the driver needs
#[derive(Debug, Deserialize)]
struct PublicJwk {
    kty: String,
    crv: Option<String>,
    x: Option<String>,
    y: Option<String>,
    d: Option<String>,
    #[serde(rename = "use")]
    key_use: Option<String>,
}

impl PublicJwk {
    /// Algorithm slot this key is dispatched on
    fn algorithm(&self) -> Result<&'static str, ResolutionError> {
        match (self.kty.as_str(), self.crv.as_deref()) {
            ("OKP", Some("Ed25519")) => Ok("EdDSA"),
            ("EC", Some("P-256")) => Ok("P-256"),
            (kty, crv) => Err(ResolutionError::InvalidKey(format!(
                "unsupported JWK kty {} / crv {:?}",
                kty, crv
            ))),
        }
    }

    /// Raw public key bytes in the layout multikey expects
    fn raw_key(&self, key_type: KeyType) -> Result<Vec<u8>, ResolutionError> {
        let x = decode_coordinate(self.x.as_deref(), "x")?;
        match key_type {
            KeyType::Ed25519 => Ok(x),
            KeyType::P256 => {
                let y = decode_coordinate(self.y.as_deref(), "y")?;
                if x.len() != 32 || y.len() != 32 {
                    return Err(ResolutionError::InvalidKey(
                        "P-256 coordinates must be 32 bytes".to_string(),
                    ));
                }
                let parity = y[31] & 1;
                let mut compressed = vec![0x02 | parity];
                compressed.extend_from_slice(&x);
                Ok(compressed)
            }
        }
    }
}

fn decode_coordinate(value: Option<&str>, name: &str) -> Result<Vec<u8>, ResolutionError> {
    let value =
        value.ok_or_else(|| ResolutionError::InvalidKey(format!("JWK is missing {}", name)))?;
    URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| ResolutionError::InvalidKey(format!("JWK {}: {}", name, e)))
}

impl DidJwkDriver {
    /// Starts a driver with no supported algorithms
    pub fn builder() -> DidJwkDriverBuilder {
        DidJwkDriverBuilder {
            registry: HandlerRegistry::new("jwk"),
        }
    }

    /// EdDSA and P-256 keys
    pub fn standard() -> Result<Self, ResolutionError> {
        Self::builder()
            .handler("EdDSA", KeyHandler::ed25519_2020())
            .handler("P-256", KeyHandler::ecdsa_multikey())
            .build()
    }

    fn decode_jwk(did: &Did) -> Result<PublicJwk, ResolutionError> {
        let raw = URL_SAFE_NO_PAD
            .decode(&did.method_specific_id)
            .map_err(|e| ResolutionError::InvalidKey(format!("did:jwk is not base64url: {}", e)))?;
        let jwk: PublicJwk = serde_json::from_slice(&raw)
            .map_err(|e| ResolutionError::InvalidKey(format!("did:jwk is not a JWK: {}", e)))?;
        if jwk.d.is_some() {
            return Err(ResolutionError::InvalidKey(
                "did:jwk must not contain private key material".to_string(),
            ));
        }
        Ok(jwk)
    }
}

/// Collects key handlers for [`DidJwkDriver`], one per JWK algorithm
#[derive(Debug, Clone)]
pub struct DidJwkDriverBuilder {
    registry: HandlerRegistry<KeyHandler>,
}

impl DidJwkDriverBuilder {
    /// Maps an algorithm (`EdDSA` for OKP Ed25519, `P-256` for EC P-256) to a handler
    pub fn handler(mut self, algorithm: &str, handler: KeyHandler) -> Self {
        self.registry.push(algorithm, handler);
        self
    }

    /// Fails if an algorithm was registered twice
    pub fn build(self) -> Result<DidJwkDriver, ResolutionError> {
        Ok(DidJwkDriver {
            handlers: self.registry.build()?,
        })
    }
}

#[async_trait]
impl DidMethodDriver for DidJwkDriver {
    fn method(&self) -> &str {
        "jwk"
    }

    async fn resolve(&self, did: &Did) -> Result<DIDDocument, ResolutionError> {
        let jwk = Self::decode_jwk(did)?;
        let algorithm = jwk.algorithm()?;

        let handler = self
            .handlers
            .iter()
            .find(|(alg, _)| alg == algorithm)
            .map(|(_, h)| h)
            .ok_or_else(|| {
                ResolutionError::ResolutionFailed(format!(
                    "no did:jwk handler registered for {}",
                    algorithm
                ))
            })?;

        let key = jwk.raw_key(handler.key_type)?;
        let id = did.base();
        let method = handler.verification_method(&id, format!("{}#0", id), &key)?;
        let mut doc = DIDDocument::with_single_key(handler.document_context(), id, method);

        // Encryption keys are only usable for key agreement
        if jwk.key_use.as_deref() == Some("enc") {
            let reference = doc.authentication.take();
            doc.assertion_method = None;
            doc.capability_invocation = None;
            doc.capability_delegation = None;
            doc.key_agreement = reference;
        }
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::encode_multikey;
    use serde_json::{json, Value};

    fn did_for(jwk: Value) -> Did {
        let encoded = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&jwk).unwrap());
        Did::parse(&format!("did:jwk:{}", encoded)).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_eddsa_matches_did_key_material() {
        let x = [11u8; 32];
        let did = did_for(json!({"kty": "OKP", "crv": "Ed25519", "x": URL_SAFE_NO_PAD.encode(x)}));

        let doc = DidJwkDriver::standard().unwrap().resolve(&did).await.unwrap();
        let vm = &doc.verification_method.as_ref().unwrap()[0];

        assert_eq!(vm.id, format!("{}#0", did.base()));
        assert_eq!(vm.method_type, "Ed25519VerificationKey2020");
        assert_eq!(
            vm.public_key_multibase,
            Some(encode_multikey(KeyType::Ed25519, &x).unwrap())
        );
        assert!(doc.key_agreement.is_none());
    }

    #[tokio::test]
    async fn test_resolve_p256_compresses_point() {
        let x = [0x21u8; 32];
        let mut y = [0x10u8; 32];
        y[31] = 0x11;
        let did = did_for(json!({
            "kty": "EC",
            "crv": "P-256",
            "x": URL_SAFE_NO_PAD.encode(x),
            "y": URL_SAFE_NO_PAD.encode(y),
        }));

        let doc = DidJwkDriver::standard().unwrap().resolve(&did).await.unwrap();
        let vm = &doc.verification_method.as_ref().unwrap()[0];

        let mut compressed = vec![0x03];
        compressed.extend_from_slice(&x);
        assert_eq!(vm.method_type, "Multikey");
        assert_eq!(
            vm.public_key_multibase,
            Some(encode_multikey(KeyType::P256, &compressed).unwrap())
        );
    }

    #[tokio::test]
    async fn test_encryption_key_only_for_key_agreement() {
        let did = did_for(json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "use": "enc",
            "x": URL_SAFE_NO_PAD.encode([3u8; 32]),
        }));

        let doc = DidJwkDriver::standard().unwrap().resolve(&did).await.unwrap();
        assert!(doc.authentication.is_none());
        assert!(doc.assertion_method.is_none());
        assert_eq!(doc.key_agreement.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_private_key_and_garbage() {
        let driver = DidJwkDriver::standard().unwrap();

        let private = did_for(json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "x": URL_SAFE_NO_PAD.encode([3u8; 32]),
            "d": URL_SAFE_NO_PAD.encode([4u8; 32]),
        }));
        assert!(matches!(driver.resolve(&private).await, Err(ResolutionError::InvalidKey(_))));

        let garbage = Did::parse("did:jwk:bm90LWpzb24").unwrap();
        assert!(matches!(driver.resolve(&garbage).await, Err(ResolutionError::InvalidKey(_))));

        let rsa = did_for(json!({"kty": "RSA", "n": "AQAB", "e": "AQAB"}));
        assert!(matches!(driver.resolve(&rsa).await, Err(ResolutionError::InvalidKey(_))));
    }

    #[test]
    fn test_duplicate_algorithm() {
        let result = DidJwkDriver::builder()
            .handler("P-256", KeyHandler::ecdsa_multikey())
            .handler("P-256", KeyHandler::ecdsa_multikey())
            .build();

        assert!(matches!(
            result,
            Err(ResolutionError::DuplicateDriverRegistration { method, key_type })
                if method == "jwk" && key_type == "P-256"
        ));
    }
}
