//! The document loader handed to credential verification.
//!
//! Every identifier is classified once and routed to exactly one source:
//! the static context table, the DID resolver, or the bounded web fetcher.
//! Errors from the chosen source are returned unchanged; there is no
//! fallback between sources.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::config::LoaderConfig;
use crate::contexts::StaticContextTable;
use crate::error::ResolutionError;
use crate::fetcher::{BoundedFetcher, WebFetcher};
use crate::identifier::Identifier;
use crate::overrides::OverrideResolver;
use crate::resolver::{CachedResolver, DidResolve};
use crate::types::{DocumentSource, RemoteDocument};

/// Resolves context URLs, DIDs and web URLs to JSON documents
#[derive(Clone)]
pub struct DocumentLoader {
    /// Pre-fetched, trusted contexts
    contexts: Arc<StaticContextTable>,
    /// Resolver for anything starting with `did:`
    did_resolver: Arc<dyn DidResolve>,
    /// Handler for remaining http(s) URLs
    web_fetcher: Arc<dyn WebFetcher>,
}

impl DocumentLoader {
    /// Starts assembling a loader from explicit parts
    pub fn builder() -> DocumentLoaderBuilder {
        DocumentLoaderBuilder::default()
    }

    /// Standard stack: bundled and configured contexts, did:key/did:jwk/did:web
    /// behind a cache, and a bounded fetcher for other web documents.
    pub fn from_config(config: &LoaderConfig) -> Result<Self, ResolutionError> {
        let fetcher = BoundedFetcher::new(config.fetch, config.user_agent.as_deref())?;
        Ok(Self {
            contexts: Arc::new(config.static_contexts()?),
            did_resolver: Arc::new(CachedResolver::from_config(config)?),
            web_fetcher: Arc::new(fetcher),
        })
    }

    /// Resolves `identifier` to a document
    ///
    /// # Example
    /// ```no_run
    /// use credential_document_loader::{DocumentLoader, LoaderConfig};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let loader = DocumentLoader::from_config(&LoaderConfig::default())?;
    ///     let doc = loader.resolve("did:web:issuer.example#key-1").await?;
    ///     println!("Verification method: {}", doc.document);
    ///     Ok(())
    /// }
    /// ```
    pub async fn resolve(&self, identifier: &str) -> Result<RemoteDocument, ResolutionError> {
        let classified = Identifier::classify(identifier, &self.contexts);
        debug!(identifier, kind = classified.kind(), "resolving document");

        let (document, source) = match classified {
            Identifier::StaticRef(url) => match self.contexts.get(url) {
                Some(document) => (document.clone(), DocumentSource::Static),
                None => return Err(ResolutionError::UnsupportedIdentifier(url.to_string())),
            },
            Identifier::DidRef(did) => {
                let result = self.did_resolver.resolve(did).await?;
                (result.document, DocumentSource::Did)
            }
            Identifier::WebRef(url) => (self.web_fetcher.fetch(&url).await?, DocumentSource::Web),
            Identifier::Unknown => {
                return Err(ResolutionError::UnsupportedIdentifier(identifier.to_string()))
            }
        };

        Ok(RemoteDocument {
            document_url: identifier.to_string(),
            context_url: None,
            document,
            source,
        })
    }

    /// A loader sharing this one's contexts and fetcher but resolving DIDs
    /// through `resolver`
    pub fn with_did_resolver(&self, resolver: Arc<dyn DidResolve>) -> Self {
        Self {
            contexts: self.contexts.clone(),
            did_resolver: resolver,
            web_fetcher: self.web_fetcher.clone(),
        }
    }

    /// A loader for one verification operation in which `overrides` replace
    /// the live documents of the DIDs they name
    ///
    /// Keys are matched exactly first. A DID URL with a fragment that has no
    /// entry of its own is dereferenced inside the override for its base DID,
    /// so `did:web:issuer.example#key-1` follows `did:web:issuer.example`.
    pub fn with_overrides(&self, overrides: HashMap<String, Value>) -> Self {
        let resolver = OverrideResolver::new(overrides, self.did_resolver.clone());
        self.with_did_resolver(Arc::new(resolver))
    }

    /// The static table this loader serves from
    pub fn contexts(&self) -> &StaticContextTable {
        &self.contexts
    }
}

/// Assembles a [`DocumentLoader`] from explicit parts
#[derive(Default)]
pub struct DocumentLoaderBuilder {
    contexts: Option<StaticContextTable>,
    did_resolver: Option<Arc<dyn DidResolve>>,
    web_fetcher: Option<Arc<dyn WebFetcher>>,
}

impl DocumentLoaderBuilder {
    /// Static contexts; an empty table when not set
    pub fn contexts(mut self, contexts: StaticContextTable) -> Self {
        self.contexts = Some(contexts);
        self
    }

    /// Resolver for `did:` identifiers
    pub fn did_resolver(mut self, resolver: Arc<dyn DidResolve>) -> Self {
        self.did_resolver = Some(resolver);
        self
    }

    /// Fetcher for the remaining http(s) URLs
    pub fn web_fetcher(mut self, fetcher: Arc<dyn WebFetcher>) -> Self {
        self.web_fetcher = Some(fetcher);
        self
    }

    /// Missing parts fall back to the defaults of [`LoaderConfig`]
    pub fn build(self) -> Result<DocumentLoader, ResolutionError> {
        let defaults = LoaderConfig::default();
        let did_resolver = match self.did_resolver {
            Some(resolver) => resolver,
            None => Arc::new(CachedResolver::from_config(&defaults)?),
        };
        let web_fetcher = match self.web_fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(BoundedFetcher::new(defaults.fetch, None)?),
        };

        Ok(DocumentLoader {
            contexts: Arc::new(self.contexts.unwrap_or_default()),
            did_resolver,
            web_fetcher,
        })
    }
}
