//! Error types for document resolution operations.
//!
//! This module provides the error kinds that can surface while resolving a
//! context URL, a DID or a web document. It uses the `thiserror` crate for
//! error handling.

use std::time::Duration;

use thiserror::Error;
use url::ParseError;

/// Errors that can occur while configuring or using the document loader
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// The identifier is neither a known context, a DID nor an http(s) URL
    #[error("Unsupported identifier: {0:?}")]
    UnsupportedIdentifier(String),

    /// No driver is registered for the DID method
    #[error("Unsupported DID method: {0}")]
    UnsupportedDidMethod(String),

    /// The DID format is invalid
    #[error("Invalid DID format")]
    InvalidDIDFormat,

    /// The DID resolution operation failed
    #[error("DID resolution failed: {0}")]
    ResolutionFailed(String),

    /// A DID URL fragment did not match any node of the resolved document
    #[error("Verification method not found: {0}")]
    VerificationMethodNotFound(String),

    /// Key material embedded in a DID is malformed
    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    /// The response body exceeded the configured size ceiling
    #[error("Response too large: limit is {limit} bytes, received at least {received}")]
    ResponseTooLarge { limit: usize, received: usize },

    /// The fetch did not complete within the configured timeout
    #[error("Fetch timed out after {0:?}")]
    FetchTimeout(Duration),

    /// The fetched body is not a JSON document
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Two drivers or key handlers were registered for the same slot
    #[error("Duplicate driver registration for method {method:?} and key type {key_type:?}")]
    DuplicateDriverRegistration { method: String, key_type: String },

    /// The same context URL was registered twice
    #[error("Duplicate static context: {0}")]
    DuplicateStaticContext(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// URL parse error
    #[error("URL parse error: {0}")]
    UrlError(#[from] ParseError),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
