//! Cached DID resolution.
//!
//! This module provides the resolver facade shared by every verification
//! session: it routes a DID to the driver registered for its method, caches
//! successful results for a bounded time, and dereferences DID URL fragments
//! into the matching node of the resolved document.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::{CacheConfig, LoaderConfig};
use crate::did::Did;
use crate::drivers::{DidJwkDriver, DidKeyDriver, DidMethodDriver, DidWebDriver};
use crate::error::ResolutionError;
use crate::fetcher::BoundedFetcher;
use crate::overrides::OverrideResolver;
use crate::types::{ResolutionMetadata, ResolutionResult};

/// Properties of a DID Document that may hold embedded, addressable nodes
const NODE_PROPERTIES: &[&str] = &[
    "verificationMethod",
    "authentication",
    "assertionMethod",
    "capabilityInvocation",
    "capabilityDelegation",
    "keyAgreement",
    "service",
];

/// Capability to resolve a DID or DID URL to a document
#[async_trait]
pub trait DidResolve: Send + Sync {
    async fn resolve(&self, did: &str) -> Result<ResolutionResult, ResolutionError>;
}

struct CacheEntry {
    document: Value,
    metadata: ResolutionMetadata,
    inserted: Instant,
}

/// DID resolver with one driver per method and a bounded in-memory cache
pub struct CachedResolver {
    /// Drivers keyed by method name
    drivers: HashMap<String, Box<dyn DidMethodDriver>>,
    /// Resolved documents keyed by bare DID
    cache: RwLock<HashMap<String, CacheEntry>>,
    /// Cache size and age limits
    config: CacheConfig,
}

impl CachedResolver {
    /// Starts collecting drivers for a new resolver
    pub fn builder() -> DidResolverBuilder {
        DidResolverBuilder::default()
    }

    /// did:key, did:jwk and did:web with the bounds from `config`
    pub fn from_config(config: &LoaderConfig) -> Result<Self, ResolutionError> {
        let web_fetcher = BoundedFetcher::new(config.fetch, config.user_agent.as_deref())?;
        Self::builder()
            .driver(DidKeyDriver::standard()?)
            .driver(DidJwkDriver::standard()?)
            .driver(DidWebDriver::new(Arc::new(web_fetcher)))
            .cache(config.cache)
            .build()
    }

    /// Registered method names
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.drivers.keys().map(String::as_str)
    }

    /// Wraps this resolver so that `overrides` take precedence over live
    /// resolution for the DIDs they name.
    pub fn make_override_resolver(
        self: &Arc<Self>,
        overrides: HashMap<String, Value>,
    ) -> OverrideResolver {
        OverrideResolver::new(overrides, self.clone())
    }

    /// Drops every cached document
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }

    /// Number of documents currently held, expired ones included
    pub async fn cached_len(&self) -> usize {
        self.cache.read().await.len()
    }

    async fn cached(&self, key: &str) -> Option<(Value, ResolutionMetadata)> {
        let cache = self.cache.read().await;
        let entry = cache.get(key)?;
        if entry.inserted.elapsed() >= self.config.max_age() {
            return None;
        }
        let mut metadata = entry.metadata.clone();
        metadata.cached = true;
        Some((entry.document.clone(), metadata))
    }

    async fn store(&self, key: String, document: Value, metadata: ResolutionMetadata) {
        if self.config.max_entries == 0 {
            return;
        }
        let max_age = self.config.max_age();
        let mut cache = self.cache.write().await;
        cache.retain(|_, entry| entry.inserted.elapsed() < max_age);

        if !cache.contains_key(&key) && cache.len() >= self.config.max_entries {
            let oldest = cache
                .iter()
                .min_by_key(|(_, entry)| entry.inserted)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                cache.remove(&oldest);
            }
        }

        cache.insert(
            key,
            CacheEntry {
                document,
                metadata,
                inserted: Instant::now(),
            },
        );
    }

    async fn resolve_document(&self, did: &Did) -> Result<ResolutionResult, ResolutionError> {
        let driver = self
            .drivers
            .get(&did.method)
            .ok_or_else(|| ResolutionError::UnsupportedDidMethod(did.method.clone()))?;

        let key = did.base();
        if let Some((document, metadata)) = self.cached(&key).await {
            debug!(did = %key, "DID cache hit");
            return Ok(ResolutionResult { document, metadata });
        }

        debug!(did = %key, "DID cache miss");
        let start_time = Instant::now();
        let document = serde_json::to_value(driver.resolve(did).await?)?;
        let metadata = ResolutionMetadata::fresh(start_time.elapsed());

        self.store(key, document.clone(), metadata.clone()).await;
        Ok(ResolutionResult { document, metadata })
    }
}

#[async_trait]
impl DidResolve for CachedResolver {
    async fn resolve(&self, did_url: &str) -> Result<ResolutionResult, ResolutionError> {
        let did = Did::parse(did_url)?;
        let result = self.resolve_document(&did).await?;

        match &did.fragment {
            Some(fragment) => {
                let node = select_fragment(&result.document, &did.base(), fragment)
                    .ok_or_else(|| ResolutionError::VerificationMethodNotFound(did_url.to_string()))?;
                Ok(ResolutionResult {
                    document: node,
                    metadata: result.metadata,
                })
            }
            None => Ok(result),
        }
    }
}

/// Finds the node addressed by `base#fragment`, accepting absolute and
/// relative ids. The document's `@context` is copied onto the node.
pub(crate) fn select_fragment(document: &Value, base: &str, fragment: &str) -> Option<Value> {
    let absolute = format!("{}#{}", base, fragment);
    let relative = format!("#{}", fragment);

    let node = NODE_PROPERTIES
        .iter()
        .filter_map(|property| document.get(*property)?.as_array())
        .flatten()
        .find(|node| {
            node.get("id")
                .and_then(Value::as_str)
                .map_or(false, |id| id == absolute || id == relative)
        })?;

    let mut node = node.clone();
    if let (Some(object), Some(context)) = (node.as_object_mut(), document.get("@context")) {
        object
            .entry("@context")
            .or_insert_with(|| context.clone());
    }
    Some(node)
}

/// Collects drivers before the resolver becomes usable
#[derive(Default)]
pub struct DidResolverBuilder {
    drivers: Vec<Box<dyn DidMethodDriver>>,
    cache: CacheConfig,
}

impl DidResolverBuilder {
    /// Registers a method driver; duplicates are reported by `build`
    pub fn driver(mut self, driver: impl DidMethodDriver + 'static) -> Self {
        self.drivers.push(Box::new(driver));
        self
    }

    /// Sets the cache size and age limits
    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    /// Fails if two drivers claim the same method
    pub fn build(self) -> Result<CachedResolver, ResolutionError> {
        let mut drivers = HashMap::with_capacity(self.drivers.len());
        for driver in self.drivers {
            let method = driver.method().to_string();
            if drivers.contains_key(&method) {
                return Err(ResolutionError::DuplicateDriverRegistration {
                    method,
                    key_type: "*".to_string(),
                });
            }
            info!(method = %method, "registered DID method driver");
            drivers.insert(method, driver);
        }

        Ok(CachedResolver {
            drivers,
            cache: RwLock::new(HashMap::new()),
            config: self.cache,
        })
    }
}
