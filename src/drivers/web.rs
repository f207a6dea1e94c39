//! `did:web` resolution over HTTPS.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::DidMethodDriver;
use crate::did::Did;
use crate::error::ResolutionError;
use crate::fetcher::WebFetcher;
use crate::types::DIDDocument;

/// Driver for `did:web`. Owns its fetcher so DID routing never shares the
/// loader's generic web handler.
#[derive(Clone)]
pub struct DidWebDriver {
    fetcher: Arc<dyn WebFetcher>,
}

impl DidWebDriver {
    /// Fetches `did.json` documents through `fetcher`
    pub fn new(fetcher: Arc<dyn WebFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl DidMethodDriver for DidWebDriver {
    fn method(&self) -> &str {
        "web"
    }

    async fn resolve(&self, did: &Did) -> Result<DIDDocument, ResolutionError> {
        let url = did.to_web_url()?;
        debug!(did = %did.base(), %url, "fetching did:web document");

        let body = self.fetcher.fetch(&url).await?;
        let document: DIDDocument = serde_json::from_value(body)
            .map_err(|e| ResolutionError::InvalidDocument(e.to_string()))?;

        if document.id != did.base() {
            return Err(ResolutionError::ResolutionFailed(format!(
                "document at {} describes {}, expected {}",
                url,
                document.id,
                did.base()
            )));
        }
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use url::Url;

    struct StubFetcher {
        body: Value,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl WebFetcher for StubFetcher {
        async fn fetch(&self, url: &Url) -> Result<Value, ResolutionError> {
            self.requested.lock().unwrap().push(url.to_string());
            Ok(self.body.clone())
        }
    }

    fn driver(body: Value) -> (DidWebDriver, Arc<StubFetcher>) {
        let stub = Arc::new(StubFetcher {
            body,
            requested: Mutex::new(Vec::new()),
        });
        (DidWebDriver::new(stub.clone()), stub)
    }

    #[tokio::test]
    async fn test_resolve_fetches_well_known_document() {
        let (driver, stub) = driver(json!({
            "@context": "https://www.w3.org/ns/did/v1",
            "id": "did:web:issuer.example",
            "verificationMethod": [{
                "id": "did:web:issuer.example#key-1",
                "type": "JsonWebKey2020",
                "controller": "did:web:issuer.example",
                "publicKeyJwk": {"kty": "OKP", "crv": "Ed25519", "x": "abc"}
            }],
            "assertionMethod": ["did:web:issuer.example#key-1"],
            "customProperty": true
        }));

        let did = Did::parse("did:web:issuer.example#key-1").unwrap();
        let doc = driver.resolve(&did).await.unwrap();

        assert_eq!(
            stub.requested.lock().unwrap().as_slice(),
            ["https://issuer.example/.well-known/did.json"]
        );
        assert_eq!(doc.extra["customProperty"], true);
        assert!(doc.verification_method.unwrap()[0].public_key_jwk.is_some());
    }

    #[tokio::test]
    async fn test_id_mismatch_fails() {
        let (driver, _) = driver(json!({
            "@context": "https://www.w3.org/ns/did/v1",
            "id": "did:web:attacker.example"
        }));

        let did = Did::parse("did:web:issuer.example").unwrap();
        assert!(matches!(
            driver.resolve(&did).await,
            Err(ResolutionError::ResolutionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_non_document_body() {
        let (driver, _) = driver(json!(["not", "a", "document"]));
        let did = Did::parse("did:web:issuer.example").unwrap();
        assert!(matches!(
            driver.resolve(&did).await,
            Err(ResolutionError::InvalidDocument(_))
        ));
    }
}
