//! `did:key` resolution.
//!
//! The document is expanded from the multikey in the identifier itself, so
//! resolution never leaves the process.

use async_trait::async_trait;

use super::{decode_multikey, DidMethodDriver, HandlerRegistry, KeyHandler};
use crate::did::Did;
use crate::error::ResolutionError;
use crate::types::DIDDocument;

/// Driver for `did:key`
#[derive(Debug, Clone)]
pub struct DidKeyDriver {
    handlers: Vec<(String, KeyHandler)>,
}

impl DidKeyDriver {
    /// Starts a driver with no supported key types
    pub fn builder() -> DidKeyDriverBuilder {
        DidKeyDriverBuilder {
            registry: HandlerRegistry::new("key"),
        }
    }

    /// Ed25519 (`z6Mk`) and P-256 (`zDna`) keys
    pub fn standard() -> Result<Self, ResolutionError> {
        Self::builder()
            .handler(KeyHandler::ed25519_2020())
            .handler(KeyHandler::ecdsa_multikey())
            .build()
    }
}

/// Collects key handlers for [`DidKeyDriver`], one per multibase header
#[derive(Debug, Clone)]
pub struct DidKeyDriverBuilder {
    registry: HandlerRegistry<KeyHandler>,
}

impl DidKeyDriverBuilder {
    /// Adds a handler, keyed by its multibase header
    pub fn handler(mut self, handler: KeyHandler) -> Self {
        self.registry
            .push(handler.key_type.multibase_header(), handler);
        self
    }

    /// Fails if two handlers share a multibase header
    pub fn build(self) -> Result<DidKeyDriver, ResolutionError> {
        Ok(DidKeyDriver {
            handlers: self.registry.build()?,
        })
    }
}

#[async_trait]
impl DidMethodDriver for DidKeyDriver {
    fn method(&self) -> &str {
        "key"
    }

    async fn resolve(&self, did: &Did) -> Result<DIDDocument, ResolutionError> {
        let multibase = &did.method_specific_id;
        let (key_type, key) = decode_multikey(multibase)?;

        let handler = self
            .handlers
            .iter()
            .map(|(_, h)| h)
            .find(|h| h.key_type == key_type)
            .ok_or_else(|| {
                ResolutionError::ResolutionFailed(format!(
                    "no did:key handler registered for {}",
                    key_type.multibase_header()
                ))
            })?;

        let id = did.base();
        let method = handler.verification_method(&id, format!("{}#{}", id, multibase), &key)?;
        Ok(DIDDocument::with_single_key(handler.document_context(), id, method))
    }
}
