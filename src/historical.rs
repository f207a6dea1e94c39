//! Classification of DIDs whose documents can change over time.

/// Methods whose document is derived from the identifier alone
const SELF_CONTAINED_METHOD_PREFIXES: &[&str] = &["did:jwk:", "did:key:"];

/// Whether verifying against `did` may require the document as it was at
/// signing time. Self-contained methods never change, every other DID might.
/// This is a syntactic check; nothing is resolved.
pub fn requires_historical_tracking(did: &str) -> bool {
    !SELF_CONTAINED_METHOD_PREFIXES
        .iter()
        .any(|prefix| did.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_contained_methods_are_static() {
        assert!(!requires_historical_tracking(
            "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK"
        ));
        assert!(!requires_historical_tracking("did:key:zDnaeexample#zDnaeexample"));
        assert!(!requires_historical_tracking("did:jwk:eyJrdHkiOiJPS1AifQ"));
    }

    #[test]
    fn test_other_methods_need_tracking() {
        for did in [
            "did:web:issuer.example",
            "did:example:123",
            "did:tdw:abc:example.com",
            "did:keyx:z6Mkabc",
            "did:jwks:abc",
        ] {
            assert!(requires_historical_tracking(did), "{did}");
        }
    }
}
