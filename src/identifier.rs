//! Structural classification of requested identifiers.

use url::Url;

use crate::contexts::StaticContextTable;

/// The resolution path an identifier belongs to
#[derive(Debug, Clone, PartialEq)]
pub enum Identifier<'a> {
    /// Exact match against the static context table
    StaticRef(&'a str),
    /// Anything starting with `did:`
    DidRef(&'a str),
    /// An `http` or `https` URL
    WebRef(Url),
    /// None of the above
    Unknown,
}

impl<'a> Identifier<'a> {
    /// Classifies `id` by shape only. The static table wins over every other
    /// rule, so a context hosted at an https URL never reaches the network.
    pub fn classify(id: &'a str, contexts: &StaticContextTable) -> Self {
        if id.is_empty() {
            return Identifier::Unknown;
        }
        if contexts.contains(id) {
            return Identifier::StaticRef(id);
        }
        if id.starts_with("did:") {
            return Identifier::DidRef(id);
        }
        if has_web_scheme(id) {
            if let Ok(url) = Url::parse(id) {
                return Identifier::WebRef(url);
            }
        }
        Identifier::Unknown
    }

    /// Short name used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Identifier::StaticRef(_) => "static",
            Identifier::DidRef(_) => "did",
            Identifier::WebRef(_) => "web",
            Identifier::Unknown => "unknown",
        }
    }
}

fn has_web_scheme(id: &str) -> bool {
    let prefix: String = id.chars().take(8).collect::<String>().to_ascii_lowercase();
    prefix.starts_with("http://") || prefix.starts_with("https://")
}
