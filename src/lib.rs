//! A bounded document loader for verifiable credential processing.
//!
//! This library maps the identifiers met while verifying a signed credential
//! to JSON documents: JSON-LD contexts are served from a static table, DIDs
//! go through a cached resolver with method-specific drivers, and any other
//! http(s) URL is fetched under a fixed size and time ceiling. It performs no
//! signature verification itself.

mod config;
mod contexts;
mod did;
mod drivers;
mod error;
mod fetcher;
mod historical;
mod identifier;
mod loader;
mod overrides;
mod resolver;
mod types;

pub use config::{CacheConfig, ContextFile, FetchBounds, LoaderConfig};
pub use contexts::{StaticContextTable, StaticContextTableBuilder, WELL_KNOWN_CONTEXTS};
pub use did::Did;
pub use drivers::{
    decode_multikey, encode_multikey, DidJwkDriver, DidJwkDriverBuilder, DidKeyDriver,
    DidKeyDriverBuilder, DidMethodDriver, DidWebDriver, KeyHandler, KeyType, VerificationSuite,
};
pub use error::ResolutionError;
pub use fetcher::{BoundedFetcher, WebFetcher};
pub use historical::requires_historical_tracking;
pub use identifier::Identifier;
pub use loader::{DocumentLoader, DocumentLoaderBuilder};
pub use overrides::OverrideResolver;
pub use resolver::{CachedResolver, DidResolve, DidResolverBuilder};
pub use types::{
    DIDDocument, DocumentSource, RemoteDocument, ResolutionMetadata, ResolutionResult, Service,
    VerificationMethod,
};

/// Well-known JSON-LD context URLs
pub mod context_urls {
    pub use crate::contexts::{
        CREDENTIALS_V1_URL, DATA_INTEGRITY_V2_URL, DID_V1_URL, ED25519_2020_URL,
        MULTIKEY_V1_URL, STATUS_LIST_V1_URL, VDL_AAMVA_V1_URL, VDL_V1_URL, X25519_2020_URL,
    };
}

/// Builds a resolver override for one verification operation
///
/// # Example
/// ```no_run
/// use std::collections::HashMap;
/// use std::sync::Arc;
/// use credential_document_loader::{make_override_resolver, CachedResolver, DidResolve, LoaderConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let live = Arc::new(CachedResolver::from_config(&LoaderConfig::default())?);
///     let historical = serde_json::json!({"id": "did:web:issuer.example"});
///     let resolver = make_override_resolver(
///         &live,
///         HashMap::from([("did:web:issuer.example".to_string(), historical)]),
///     );
///     let result = resolver.resolve("did:web:issuer.example").await?;
///     println!("Resolved: {}", result.document);
///     Ok(())
/// }
/// ```
pub fn make_override_resolver(
    live: &std::sync::Arc<CachedResolver>,
    overrides: std::collections::HashMap<String, serde_json::Value>,
) -> OverrideResolver {
    live.make_override_resolver(overrides)
}
