//! Static JSON-LD context documents.
//!
//! Contexts registered here are served verbatim and never fetched. The table
//! is built once and is read-only afterwards.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::ResolutionError;

/// `did-context`
pub const DID_V1_URL: &str = "https://www.w3.org/ns/did/v1";
/// `credentials-context`
pub const CREDENTIALS_V1_URL: &str = "https://www.w3.org/2018/credentials/v1";
/// `@digitalbazaar/data-integrity-context`
pub const DATA_INTEGRITY_V2_URL: &str = "https://w3id.org/security/data-integrity/v2";
/// `ed25519-signature-2020-context`
pub const ED25519_2020_URL: &str = "https://w3id.org/security/suites/ed25519-2020/v1";
/// `x25519-key-agreement-2020-context`
pub const X25519_2020_URL: &str = "https://w3id.org/security/suites/x25519-2020/v1";
/// Multikey verification method context
pub const MULTIKEY_V1_URL: &str = "https://w3id.org/security/multikey/v1";
/// `@digitalbazaar/vc-status-list-context`
pub const STATUS_LIST_V1_URL: &str = "https://w3id.org/vc/status-list/2021/v1";
/// `@digitalbazaar/vdl-context`
pub const VDL_V1_URL: &str = "https://w3id.org/vdl/v1";
/// `@digitalbazaar/vdl-aamva-context`
pub const VDL_AAMVA_V1_URL: &str = "https://w3id.org/vdl/aamva/v1";

/// Context URLs a credential verifier is expected to have locally
pub const WELL_KNOWN_CONTEXTS: &[&str] = &[
    ED25519_2020_URL,
    X25519_2020_URL,
    DATA_INTEGRITY_V2_URL,
    DID_V1_URL,
    CREDENTIALS_V1_URL,
    STATUS_LIST_V1_URL,
    VDL_V1_URL,
    VDL_AAMVA_V1_URL,
];

/// Context bodies compiled into the crate, one per [`WELL_KNOWN_CONTEXTS`] entry
const BUNDLED: &[(&str, &str)] = &[
    (ED25519_2020_URL, include_str!("contexts/ed25519-2020-v1.json")),
    (X25519_2020_URL, include_str!("contexts/x25519-2020-v1.json")),
    (DATA_INTEGRITY_V2_URL, include_str!("contexts/data-integrity-v2.json")),
    (DID_V1_URL, include_str!("contexts/did-v1.json")),
    (CREDENTIALS_V1_URL, include_str!("contexts/credentials-v1.json")),
    (STATUS_LIST_V1_URL, include_str!("contexts/status-list-2021-v1.json")),
    (VDL_V1_URL, include_str!("contexts/vdl-v1.json")),
    (VDL_AAMVA_V1_URL, include_str!("contexts/vdl-aamva-v1.json")),
];

/// Immutable mapping from context URL to document
#[derive(Debug, Clone, Default)]
pub struct StaticContextTable {
    entries: HashMap<String, Value>,
}

impl StaticContextTable {
    /// Starts collecting entries
    pub fn builder() -> StaticContextTableBuilder {
        StaticContextTableBuilder::default()
    }

    /// Looks up a document by exact URL
    pub fn get(&self, url: &str) -> Option<&Value> {
        self.entries.get(url)
    }

    /// Whether `url` is registered
    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    /// Number of registered contexts
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no context is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered URLs, in no particular order
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Collects static contexts; duplicates are reported by [`build`](Self::build)
#[derive(Debug, Default)]
pub struct StaticContextTableBuilder {
    entries: Vec<(String, Value)>,
}

impl StaticContextTableBuilder {
    /// Adds a context document
    pub fn insert(mut self, url: impl Into<String>, document: Value) -> Self {
        self.entries.push((url.into(), document));
        self
    }

    /// Adds the well-known contexts shipped with the crate
    pub fn bundled(mut self) -> Result<Self, ResolutionError> {
        for (url, raw) in BUNDLED {
            let document: Value = serde_json::from_str(raw)
                .map_err(|e| ResolutionError::InvalidDocument(format!("{}: {}", url, e)))?;
            self = self.insert(*url, document);
        }
        Ok(self)
    }

    /// Adds a context document read from a JSON file
    pub fn insert_file(
        self,
        url: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Self, ResolutionError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            ResolutionError::Config(format!("cannot read context {}: {}", path.display(), e))
        })?;
        let document: Value = serde_json::from_str(&raw).map_err(|e| {
            ResolutionError::InvalidDocument(format!("{}: {}", path.display(), e))
        })?;
        Ok(self.insert(url, document))
    }

    /// Freezes the table. A URL registered twice is rejected rather than
    /// silently overwritten.
    pub fn build(self) -> Result<StaticContextTable, ResolutionError> {
        let mut entries = HashMap::with_capacity(self.entries.len());
        for (url, document) in self.entries {
            if entries.contains_key(&url) {
                return Err(ResolutionError::DuplicateStaticContext(url));
            }
            debug!(url = %url, "registered static context");
            entries.insert(url, document);
        }
        Ok(StaticContextTable { entries })
    }
}
