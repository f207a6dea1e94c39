//! Bounded retrieval of JSON documents over HTTP(S).
//!
//! Every fetch carries `no-cache` headers, is cut off after the configured
//! timeout and is rejected, never truncated, once the body grows past the
//! configured size. A failed fetch is not retried.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CACHE_CONTROL, PRAGMA};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::FetchBounds;
use crate::error::ResolutionError;

const ACCEPT_JSON: &str = "application/ld+json, application/json";

/// Capability to retrieve a JSON document from a web URL
#[async_trait]
pub trait WebFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Value, ResolutionError>;
}

/// reqwest-backed fetcher enforcing [`FetchBounds`]
#[derive(Debug, Clone)]
pub struct BoundedFetcher {
    /// HTTP client for document requests
    client: Client,
    /// Size and time ceilings
    bounds: FetchBounds,
}

impl BoundedFetcher {
    /// Creates a fetcher with its own client
    pub fn new(bounds: FetchBounds, user_agent: Option<&str>) -> Result<Self, ResolutionError> {
        let mut builder = Client::builder().timeout(bounds.timeout());
        if let Some(agent) = user_agent {
            builder = builder.user_agent(agent.to_string());
        }
        Ok(Self::with_client(builder.build()?, bounds))
    }

    /// Uses a preconfigured client; the bounds are still enforced on top
    pub fn with_client(client: Client, bounds: FetchBounds) -> Self {
        Self { client, bounds }
    }

    /// The size and time ceilings applied to every fetch
    pub fn bounds(&self) -> FetchBounds {
        self.bounds
    }

    async fn fetch_body(&self, url: &Url) -> Result<Vec<u8>, ResolutionError> {
        let limit = self.bounds.max_bytes;

        let mut response = self
            .client
            .get(url.clone())
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .header(ACCEPT, ACCEPT_JSON)
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        if !response.status().is_success() {
            return Err(ResolutionError::ResolutionFailed(format!(
                "HTTP {} when fetching {}",
                response.status(),
                url
            )));
        }

        if let Some(declared) = response.content_length() {
            let declared = usize::try_from(declared).unwrap_or(usize::MAX);
            if declared > limit {
                return Err(ResolutionError::ResponseTooLarge {
                    limit,
                    received: declared,
                });
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.transport_error(url, e))? {
            let received = body.len() + chunk.len();
            if received > limit {
                return Err(ResolutionError::ResponseTooLarge { limit, received });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    /// Connection and protocol failures surface as `ResolutionFailed`
    fn transport_error(&self, url: &Url, error: reqwest::Error) -> ResolutionError {
        if error.is_timeout() {
            ResolutionError::FetchTimeout(self.bounds.timeout())
        } else {
            ResolutionError::ResolutionFailed(format!("fetching {}: {}", url, error))
        }
    }
}

#[async_trait]
impl WebFetcher for BoundedFetcher {
    async fn fetch(&self, url: &Url) -> Result<Value, ResolutionError> {
        let timeout = self.bounds.timeout();
        debug!(%url, max_bytes = self.bounds.max_bytes, ?timeout, "fetching document");

        let body = match tokio::time::timeout(timeout, self.fetch_body(url)).await {
            Ok(result) => result,
            Err(_) => Err(ResolutionError::FetchTimeout(timeout)),
        }
        .map_err(|e| {
            warn!(%url, error = %e, "document fetch failed");
            e
        })?;

        serde_json::from_slice(&body).map_err(|e| ResolutionError::InvalidDocument(e.to_string()))
    }
}
