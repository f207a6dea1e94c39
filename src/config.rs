//! Loader configuration.
//!
//! Everything here is read once at initialization; nothing can be changed
//! per request.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::contexts::StaticContextTable;
use crate::error::ResolutionError;

/// Size and time ceilings applied to every web fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchBounds {
    /// Maximum response body size in bytes
    pub max_bytes: usize,
    /// Wall-clock limit for the whole request in milliseconds
    pub timeout_ms: u64,
}

impl FetchBounds {
    /// The wall-clock limit as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for FetchBounds {
    fn default() -> Self {
        Self {
            max_bytes: 8192,
            timeout_ms: 5000,
        }
    }
}

/// DID resolution cache parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached DID documents
    pub max_entries: usize,
    /// How long a cached document stays valid, in milliseconds
    pub max_age_ms: u64,
}

impl CacheConfig {
    /// Cache entry lifetime as a `Duration`
    pub fn max_age(&self) -> Duration {
        Duration::from_millis(self.max_age_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 100,
            max_age_ms: 5000,
        }
    }
}

/// A static context whose body lives on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextFile {
    pub url: String,
    pub path: PathBuf,
}

/// Top-level configuration, usually read from a TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Bounds for generic http(s) documents and did:web documents
    pub fetch: FetchBounds,
    /// DID resolver cache
    pub cache: CacheConfig,
    /// Optional `User-Agent` for outgoing requests
    pub user_agent: Option<String>,
    /// Seed the static table with the contexts compiled into the crate
    pub bundled_contexts: bool,
    /// Static contexts loaded at startup
    pub contexts: Vec<ContextFile>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            fetch: FetchBounds::default(),
            cache: CacheConfig::default(),
            user_agent: None,
            bundled_contexts: true,
            contexts: Vec::new(),
        }
    }
}

impl LoaderConfig {
    /// Parses a TOML document; missing keys take their defaults
    pub fn from_toml_str(raw: &str) -> Result<Self, ResolutionError> {
        toml::from_str(raw).map_err(|e| ResolutionError::Config(e.to_string()))
    }

    /// Reads and parses a TOML file. Relative context paths are resolved
    /// against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ResolutionError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| ResolutionError::Config(format!("{}: {}", path.display(), e)))?;
        let mut config = Self::from_toml_str(&raw)?;

        if let Some(dir) = path.parent() {
            for context in &mut config.contexts {
                if context.path.is_relative() {
                    context.path = dir.join(&context.path);
                }
            }
        }
        Ok(config)
    }

    /// Builds the static table: bundled contexts first, then the configured
    /// files. A file may not re-register a bundled URL.
    pub fn static_contexts(&self) -> Result<StaticContextTable, ResolutionError> {
        let mut builder = StaticContextTable::builder();
        if self.bundled_contexts {
            builder = builder.bundled()?;
        }
        for context in &self.contexts {
            builder = builder.insert_file(context.url.clone(), &context.path)?;
        }
        builder.build()
    }
}
