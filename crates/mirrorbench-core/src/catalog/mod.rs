//! Mirror catalog: candidate records from the mirror status service.
//!
//! Uses the curl crate (libcurl) to GET the status JSON document and serde to
//! decode each mirror record into an immutable [`Candidate`].

mod parse;

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use parse::parse;

/// Default mirror status endpoint.
pub const DEFAULT_CATALOG_URL: &str = "https://archlinux.org/mirrors/status/json/";

/// Fatal errors while obtaining the catalog. Any of these aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Http(#[from] curl::Error),
    #[error("catalog returned HTTP {0}")]
    Status(u32),
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog lists no mirrors")]
    Empty,
}

/// Transport protocol a mirror is served over.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Protocol {
    Https,
    Http,
    Rsync,
    Other(String),
}

impl Protocol {
    /// Only secure transports are eligible for ranking.
    pub fn is_secure(&self) -> bool {
        matches!(self, Protocol::Https)
    }
}

impl From<String> for Protocol {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "https" => Protocol::Https,
            "http" => Protocol::Http,
            "rsync" => Protocol::Rsync,
            _ => Protocol::Other(s),
        }
    }
}

impl From<Protocol> for String {
    fn from(p: Protocol) -> Self {
        p.to_string()
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Https => f.write_str("https"),
            Protocol::Http => f.write_str("http"),
            Protocol::Rsync => f.write_str("rsync"),
            Protocol::Other(s) => f.write_str(s),
        }
    }
}

/// One mirror as reported by the status service. Never mutated after decoding.
///
/// Nullable fields stay `None` when the service has no data; such candidates
/// fail the corresponding filter criterion rather than the parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Base repository URL, normally with a trailing slash.
    pub url: String,
    pub protocol: Protocol,
    #[serde(default)]
    pub country: String,
    /// Uppercase ISO country code, empty when unknown.
    #[serde(default)]
    pub country_code: String,
    /// Last time the mirror synced, according to the status checker.
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
    /// Fraction of checks that succeeded, between 0.0 and 1.0.
    #[serde(default)]
    pub completion_pct: Option<f64>,
    /// Average mirroring delay in seconds.
    #[serde(default)]
    pub delay: Option<i64>,
    #[serde(default)]
    pub duration_avg: Option<f64>,
    #[serde(default)]
    pub duration_stddev: Option<f64>,
    /// Historical score from the status checker (lower is better). Informational.
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub ipv4: bool,
    #[serde(default)]
    pub ipv6: bool,
    #[serde(default)]
    pub isos: bool,
    #[serde(default)]
    pub details: Option<String>,
}

impl Candidate {
    /// Host name used as the endpoint identifier in logs and reports.
    /// Falls back to the raw URL when it has no parseable host.
    pub fn hostname(&self) -> String {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| self.url.clone())
    }
}

/// Fetches and decodes the catalog at `url`.
///
/// Runs in the current thread; call from `spawn_blocking` if used from async code.
pub fn fetch(url: &str, connect_timeout: Duration) -> Result<Vec<Candidate>, CatalogError> {
    let mut body: Vec<u8> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.connect_timeout(connect_timeout)?;
    easy.timeout(Duration::from_secs(60))?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(CatalogError::Status(code));
    }

    let candidates = parse(&body)?;
    tracing::info!(url, mirrors = candidates.len(), "fetched mirror catalog");
    Ok(candidates)
}
