//! Decode the mirror status JSON document into candidates.

use serde::Deserialize;

use super::{Candidate, CatalogError};

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    urls: Vec<Candidate>,
}

/// Parse a status document (`{"urls": [...]}`). An empty mirror list is an error.
pub fn parse(bytes: &[u8]) -> Result<Vec<Candidate>, CatalogError> {
    let doc: CatalogDocument = serde_json::from_slice(bytes)?;
    if doc.urls.is_empty() {
        return Err(CatalogError::Empty);
    }
    Ok(doc.urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Protocol;

    const DOC: &str = r#"{
        "cutoff": 86400,
        "urls": [
            {
                "url": "https://mirror.example.nl/archlinux/",
                "protocol": "https",
                "last_sync": "2025-03-01T10:00:00Z",
                "completion_pct": 1.0,
                "delay": 1200,
                "duration_avg": 0.25,
                "duration_stddev": 0.05,
                "score": 0.9,
                "active": true,
                "country": "Netherlands",
                "country_code": "NL",
                "isos": true,
                "ipv4": true,
                "ipv6": false,
                "details": "https://archlinux.org/mirrors/example/1/"
            },
            {
                "url": "rsync://mirror.example.de/arch/",
                "protocol": "rsync",
                "last_sync": null,
                "completion_pct": null,
                "delay": null,
                "duration_avg": null,
                "duration_stddev": null,
                "score": null,
                "active": false,
                "country": "",
                "country_code": "",
                "isos": false,
                "ipv4": true,
                "ipv6": true,
                "details": "https://archlinux.org/mirrors/example/2/"
            }
        ]
    }"#;

    #[test]
    fn parse_full_and_null_records() {
        let mirrors = parse(DOC.as_bytes()).unwrap();
        assert_eq!(mirrors.len(), 2);

        let nl = &mirrors[0];
        assert_eq!(nl.protocol, Protocol::Https);
        assert_eq!(nl.country_code, "NL");
        assert_eq!(nl.delay, Some(1200));
        assert_eq!(nl.completion_pct, Some(1.0));
        assert!(nl.last_sync.is_some());
        assert_eq!(nl.hostname(), "mirror.example.nl");

        let de = &mirrors[1];
        assert_eq!(de.protocol, Protocol::Rsync);
        assert!(de.last_sync.is_none());
        assert!(de.delay.is_none());
        assert!(!de.active);
    }

    #[test]
    fn unknown_protocol_is_kept_not_rejected() {
        let doc = r#"{"urls": [{"url": "ftp://x.example/", "protocol": "ftp"}]}"#;
        let mirrors = parse(doc.as_bytes()).unwrap();
        assert_eq!(mirrors[0].protocol, Protocol::Other("ftp".to_string()));
        assert!(!mirrors[0].protocol.is_secure());
    }

    #[test]
    fn empty_catalog_is_an_error() {
        let err = parse(br#"{"urls": []}"#).unwrap_err();
        assert!(matches!(err, CatalogError::Empty));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = parse(b"<html>").unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }
}
