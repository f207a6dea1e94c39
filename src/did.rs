//! DID parsing and URL transformation functionality.
//!
//! This module handles the parsing and validation of DID URLs into their
//! method, method-specific identifier, path, query and fragment, and the
//! transformation of `did:web` identifiers into HTTPS URLs.

use crate::error::ResolutionError;
use url::Url;

/// Represents a parsed DID URL
#[derive(Debug, Clone, PartialEq)]
pub struct Did {
    /// The method name, e.g. `key` or `web`
    pub method: String,
    /// The method-specific identifier
    pub method_specific_id: String,
    /// Optional path component (without the leading `/`)
    pub path: Option<String>,
    /// Optional query component (without the leading `?`)
    pub query: Option<String>,
    /// Optional fragment (without the leading `#`)
    pub fragment: Option<String>,
}

impl Did {
    /// Parses and validates a DID or DID URL string
    pub fn parse(did: &str) -> Result<Self, ResolutionError> {
        let rest = did
            .strip_prefix("did:")
            .ok_or(ResolutionError::InvalidDIDFormat)?;

        let (rest, fragment) = split_once_owned(rest, '#');
        let (rest, query) = split_once_owned(&rest, '?');
        let (rest, path) = split_once_owned(&rest, '/');

        let (method, method_specific_id) = rest
            .split_once(':')
            .ok_or(ResolutionError::InvalidDIDFormat)?;

        if method.is_empty()
            || !method
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(ResolutionError::InvalidDIDFormat);
        }

        if method_specific_id.is_empty()
            || method_specific_id.ends_with(':')
            || !method_specific_id.chars().all(is_id_char)
        {
            return Err(ResolutionError::InvalidDIDFormat);
        }

        Ok(Self {
            method: method.to_string(),
            method_specific_id: method_specific_id.to_string(),
            path,
            query,
            fragment,
        })
    }

    /// The bare DID, without path, query or fragment
    pub fn base(&self) -> String {
        format!("did:{}:{}", self.method, self.method_specific_id)
    }

    /// Converts the Did back to its string representation
    pub fn to_string(&self) -> String {
        let mut did = self.base();
        if let Some(path) = &self.path {
            did.push_str(&format!("/{}", path));
        }
        if let Some(query) = &self.query {
            did.push_str(&format!("?{}", query));
        }
        if let Some(fragment) = &self.fragment {
            did.push_str(&format!("#{}", fragment));
        }
        did
    }

    /// Converts a `did:web` identifier to the HTTPS URL of its DID Document
    pub fn to_web_url(&self) -> Result<Url, ResolutionError> {
        if self.method != "web" {
            return Err(ResolutionError::InvalidDIDFormat);
        }

        let mut segments = self.method_specific_id.split(':');
        let domain = segments
            .next()
            .filter(|d| !d.is_empty())
            .ok_or(ResolutionError::InvalidDIDFormat)?
            .replace("%3A", ":")
            .replace("%3a", ":");

        let path: Vec<&str> = segments.collect();
        if path.iter().any(|s| s.is_empty()) {
            return Err(ResolutionError::InvalidDIDFormat);
        }

        let mut url = format!("https://{}", domain);
        if path.is_empty() {
            url.push_str("/.well-known");
        } else {
            url.push_str(&format!("/{}", path.join("/")));
        }
        url.push_str("/did.json");

        Url::parse(&url).map_err(ResolutionError::from)
    }
}

fn split_once_owned(input: &str, sep: char) -> (String, Option<String>) {
    match input.split_once(sep) {
        Some((head, tail)) => (head.to_string(), Some(tail.to_string())),
        None => (input.to_string(), None),
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':' | '%')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_did_parsing() {
        let test_cases = vec![
            (
                "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK",
                ("key", "z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK", None, None, None),
            ),
            (
                "did:web:example.com%3A8443:users:alice#key-1",
                ("web", "example.com%3A8443:users:alice", None, None, Some("key-1")),
            ),
            (
                "did:example:123/path/to?service=files#frag",
                ("example", "123", Some("path/to"), Some("service=files"), Some("frag")),
            ),
        ];

        for (input, expected) in test_cases {
            let parsed = Did::parse(input).unwrap();
            assert_eq!(parsed.method, expected.0);
            assert_eq!(parsed.method_specific_id, expected.1);
            assert_eq!(parsed.path, expected.2.map(String::from));
            assert_eq!(parsed.query, expected.3.map(String::from));
            assert_eq!(parsed.fragment, expected.4.map(String::from));
            assert_eq!(parsed.to_string(), input);
        }
    }

    #[test]
    fn test_invalid_did_format() {
        let invalid_dids = vec![
            "did:",
            "did:key",
            "did:key:",
            "did:KEY:abc",
            "did:web:example.com:",
            "web:example.com",
            "https://example.com",
        ];

        for did in invalid_dids {
            assert!(
                matches!(Did::parse(did), Err(ResolutionError::InvalidDIDFormat)),
                "{did} should be rejected"
            );
        }
    }

    #[test]
    fn test_base_strips_fragment() {
        let did = Did::parse("did:key:z6Mkabc#z6Mkabc").unwrap();
        assert_eq!(did.base(), "did:key:z6Mkabc");
    }

    #[test]
    fn test_web_url_transformation() {
        let test_cases = vec![
            ("did:web:example.com", "https://example.com/.well-known/did.json"),
            ("did:web:example.com%3A8443", "https://example.com:8443/.well-known/did.json"),
            ("did:web:example.com:users:alice", "https://example.com/users/alice/did.json"),
        ];

        for (did, expected_url) in test_cases {
            let parsed = Did::parse(did).unwrap();
            assert_eq!(parsed.to_web_url().unwrap().as_str(), expected_url);
        }
    }

    #[test]
    fn test_web_url_requires_web_method() {
        let did = Did::parse("did:key:z6Mkabc").unwrap();
        assert!(matches!(did.to_web_url(), Err(ResolutionError::InvalidDIDFormat)));
    }
}
