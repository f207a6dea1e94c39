//! DID resolution with caller-supplied documents taking precedence.
//!
//! Used when re-verifying a presentation that was signed against an older
//! DID Document: the caller supplies the historical documents and everything
//! else resolves live.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::did::Did;
use crate::error::ResolutionError;
use crate::resolver::{select_fragment, DidResolve};
use crate::types::{ResolutionMetadata, ResolutionResult};

/// Resolver that consults an override map before a live resolver
#[derive(Clone)]
pub struct OverrideResolver {
    /// Documents keyed by the DID (or DID URL) they replace
    overrides: HashMap<String, Value>,
    /// Fallback for everything not overridden
    live: Arc<dyn DidResolve>,
}

impl OverrideResolver {
    /// Serves `overrides` ahead of `live`
    pub fn new(overrides: HashMap<String, Value>, live: Arc<dyn DidResolve>) -> Self {
        Self { overrides, live }
    }

    /// Whether `did` is served from the override map, either by its own
    /// entry or through the entry for its base DID
    pub fn overrides(&self, did: &str) -> bool {
        self.overrides.contains_key(did) || self.base_override(did).is_some()
    }

    /// Override document of the base DID when `did` carries a fragment
    fn base_override(&self, did: &str) -> Option<(String, String, &Value)> {
        let parsed = Did::parse(did).ok()?;
        let fragment = parsed.fragment.clone()?;
        let base = parsed.base();
        let document = self.overrides.get(&base)?;
        Some((base, fragment, document))
    }
}

fn overridden(document: Value) -> ResolutionResult {
    let mut metadata = ResolutionMetadata::fresh(Duration::ZERO);
    metadata.overridden = true;
    ResolutionResult { document, metadata }
}

#[async_trait]
impl DidResolve for OverrideResolver {
    async fn resolve(&self, did: &str) -> Result<ResolutionResult, ResolutionError> {
        if let Some(document) = self.overrides.get(did) {
            debug!(did, "serving overridden DID document");
            return Ok(overridden(document.clone()));
        }

        if let Some((base, fragment, document)) = self.base_override(did) {
            debug!(did, "dereferencing fragment in overridden DID document");
            return select_fragment(document, &base, &fragment)
                .map(overridden)
                .ok_or_else(|| ResolutionError::VerificationMethodNotFound(did.to_string()));
        }

        self.live.resolve(did).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::resolver::tests::CountingDriver;
    use crate::resolver::CachedResolver;
    use serde_json::json;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_override_wins_over_live_document() {
        let (driver, calls) = CountingDriver::new("example");
        let live = Arc::new(
            CachedResolver::builder()
                .driver(driver)
                .cache(CacheConfig::default())
                .build()
                .unwrap(),
        );

        let doc_a = json!({"id": "did:example:123", "note": "as signed"});
        let resolver = live.make_override_resolver(HashMap::from([(
            "did:example:123".to_string(),
            doc_a.clone(),
        )]));

        let overridden = resolver.resolve("did:example:123").await.unwrap();
        assert_eq!(overridden.document, doc_a);
        assert!(overridden.metadata.overridden);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let doc_b = live.resolve("did:example:123").await.unwrap().document;
        assert_ne!(doc_b, doc_a);

        let other = resolver.resolve("did:example:456").await.unwrap();
        assert_eq!(other.document["id"], "did:example:456");
        assert!(!other.metadata.overridden);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fragment_resolves_inside_base_override() {
        let (driver, calls) = CountingDriver::new("example");
        let live: Arc<dyn DidResolve> =
            Arc::new(CachedResolver::builder().driver(driver).build().unwrap());
        let historical = json!({
            "@context": "https://www.w3.org/ns/did/v1",
            "id": "did:example:123",
            "verificationMethod": [{
                "id": "did:example:123#key-1",
                "type": "Ed25519VerificationKey2020",
                "controller": "did:example:123",
                "publicKeyMultibase": "zHistorical"
            }]
        });
        let resolver = OverrideResolver::new(
            HashMap::from([("did:example:123".to_string(), historical)]),
            live,
        );

        assert!(resolver.overrides("did:example:123"));
        assert!(resolver.overrides("did:example:123#key-1"));
        assert!(!resolver.overrides("did:example:456#key-1"));

        let vm = resolver.resolve("did:example:123#key-1").await.unwrap();
        assert_eq!(vm.document["publicKeyMultibase"], "zHistorical");
        assert_eq!(vm.document["@context"], "https://www.w3.org/ns/did/v1");
        assert!(vm.metadata.overridden);

        assert!(matches!(
            resolver.resolve("did:example:123#key-2").await,
            Err(ResolutionError::VerificationMethodNotFound(_))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let live_vm = resolver.resolve("did:example:456#key-1").await.unwrap();
        assert_eq!(live_vm.document["publicKeyMultibase"], "zLive");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exact_fragment_entry_takes_precedence() {
        let (driver, _) = CountingDriver::new("example");
        let live: Arc<dyn DidResolve> =
            Arc::new(CachedResolver::builder().driver(driver).build().unwrap());
        let pinned = json!({"id": "did:example:123#key-1", "publicKeyMultibase": "zPinned"});
        let resolver = OverrideResolver::new(
            HashMap::from([
                ("did:example:123".to_string(), json!({"id": "did:example:123"})),
                ("did:example:123#key-1".to_string(), pinned.clone()),
            ]),
            live,
        );

        assert_eq!(resolver.resolve("did:example:123#key-1").await.unwrap().document, pinned);
    }

    #[tokio::test]
    async fn test_live_errors_pass_through() {
        let (mut driver, _) = CountingDriver::new("example");
        driver.fail = true;
        let live: Arc<dyn DidResolve> =
            Arc::new(CachedResolver::builder().driver(driver).build().unwrap());
        let resolver = OverrideResolver::new(HashMap::new(), live);

        assert!(matches!(
            resolver.resolve("did:example:123").await,
            Err(ResolutionError::ResolutionFailed(_))
        ));
    }
}
