//! Core types for document resolution.
//!
//! This module provides the data structures shared by the loader: DID
//! Documents produced by the method drivers, the JSON-LD style remote
//! document returned to callers, and resolution metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A DID Document as defined in the DID Core specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DIDDocument {
    /// The context of the DID Document, a string or an array
    #[serde(rename = "@context")]
    pub context: Value,

    /// The DID itself
    pub id: String,

    /// Other DIDs that are associated with this DID Document
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "alsoKnownAs")]
    pub also_known_as: Option<Vec<String>>,

    /// Verification methods associated with this DID
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "verificationMethod")]
    pub verification_method: Option<Vec<VerificationMethod>>,

    /// Authentication verification methods (references or embedded nodes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Vec<Value>>,

    /// Assertion verification methods
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "assertionMethod")]
    pub assertion_method: Option<Vec<Value>>,

    /// Capability invocation verification methods
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "capabilityInvocation")]
    pub capability_invocation: Option<Vec<Value>>,

    /// Capability delegation verification methods
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "capabilityDelegation")]
    pub capability_delegation: Option<Vec<Value>>,

    /// Key agreement verification methods
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "keyAgreement")]
    pub key_agreement: Option<Vec<Value>>,

    /// Services associated with this DID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<Vec<Service>>,

    /// Any property not modelled above, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DIDDocument {
    /// Creates a document with a single verification method that is
    /// referenced from every signing relationship.
    pub fn with_single_key(context: Value, id: String, method: VerificationMethod) -> Self {
        let reference = || Some(vec![Value::String(method.id.clone())]);
        Self {
            context,
            id,
            also_known_as: None,
            authentication: reference(),
            assertion_method: reference(),
            capability_invocation: reference(),
            capability_delegation: reference(),
            key_agreement: None,
            verification_method: Some(vec![method]),
            service: None,
            extra: Map::new(),
        }
    }
}

/// A verification method in a DID Document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationMethod {
    /// The unique identifier for this verification method
    pub id: String,

    /// The type of the verification method
    #[serde(rename = "type")]
    pub method_type: String,

    /// The controller of this verification method
    pub controller: String,

    /// The public key in multibase format
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "publicKeyMultibase")]
    pub public_key_multibase: Option<String>,

    /// The public key as a JWK
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "publicKeyJwk")]
    pub public_key_jwk: Option<Value>,
}

/// A service endpoint in a DID Document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// The unique identifier for this service
    pub id: String,

    /// The type of the service
    #[serde(rename = "type")]
    pub service_type: Value,

    /// The endpoint URL or object
    #[serde(rename = "serviceEndpoint")]
    pub service_endpoint: Value,
}

/// Which resolution path produced a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSource {
    /// The static context table
    Static,
    /// The DID resolver (live, cached or overridden)
    Did,
    /// The bounded web fetcher
    Web,
}

/// A resolved document in the shape expected by JSON-LD processors
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    /// The identifier that was requested
    pub document_url: String,

    /// Context URL from a `Link` header; never set by this loader
    pub context_url: Option<String>,

    /// The document body
    pub document: Value,

    /// Where the document came from
    pub source: DocumentSource,
}

/// Resolution result containing a DID Document (or a node of one) and metadata
#[derive(Debug, Clone)]
pub struct ResolutionResult {
    /// The resolved document
    pub document: Value,

    /// Metadata about the resolution process
    pub metadata: ResolutionMetadata,
}

/// Metadata about the resolution process
#[derive(Debug, Clone)]
pub struct ResolutionMetadata {
    /// Content type of the resolved document
    pub content_type: String,

    /// When the document was retrieved from its driver
    pub retrieved: DateTime<Utc>,

    /// How long the driver took
    pub duration: std::time::Duration,

    /// Whether the result was served from the resolver cache
    pub cached: bool,

    /// Whether the result came from a caller-supplied override
    pub overridden: bool,
}

impl ResolutionMetadata {
    pub(crate) fn fresh(duration: std::time::Duration) -> Self {
        Self {
            content_type: "application/did+json".to_string(),
            retrieved: Utc::now(),
            duration,
            cached: false,
            overridden: false,
        }
    }
}
