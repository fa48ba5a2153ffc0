//! Payload tiers: named size classes used to stage probes from cheap to expensive.
//!
//! Each tier maps to a fixed resource path on every mirror. The approximate
//! sizes are only used for log output and tuning; the prober always records
//! the byte count it actually received.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Payload size class, ordered from smallest to largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// A few bytes (`lastsync`). Latency dominated.
    Tiny,
    /// About 120 kB.
    Small,
    /// About 1.4 MB.
    Medium,
    /// About 8.2 MB.
    Large,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Tiny, Tier::Small, Tier::Medium, Tier::Large];

    /// Approximate payload size in bytes.
    pub fn approx_bytes(self) -> u64 {
        match self {
            Tier::Tiny => 10,
            Tier::Small => 120_000,
            Tier::Medium => 1_400_000,
            Tier::Large => 8_200_000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Tiny => "tiny",
            Tier::Small => "small",
            Tier::Medium => "medium",
            Tier::Large => "large",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown payload tier: {0:?} (expected tiny, small, medium or large)")]
pub struct UnknownTier(pub String);

impl FromStr for Tier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownTier(s.to_string()))
    }
}

/// Resource path for each tier, relative to a mirror's base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierPaths {
    pub tiny: String,
    pub small: String,
    pub medium: String,
    pub large: String,
}

impl Default for TierPaths {
    fn default() -> Self {
        Self {
            tiny: "lastsync".to_string(),
            small: "core/os/x86_64/core.db".to_string(),
            medium: "core/os/x86_64/core.files".to_string(),
            large: "extra/os/x86_64/extra.db".to_string(),
        }
    }
}

impl TierPaths {
    pub fn path(&self, tier: Tier) -> &str {
        match tier {
            Tier::Tiny => &self.tiny,
            Tier::Small => &self.small,
            Tier::Medium => &self.medium,
            Tier::Large => &self.large,
        }
    }

    /// Full URL of the tier's resource on the mirror at `base_url`.
    pub fn url_for(&self, base_url: &str, tier: Tier) -> String {
        let path = self.path(tier).trim_start_matches('/');
        if base_url.ends_with('/') {
            format!("{base_url}{path}")
        } else {
            format!("{base_url}/{path}")
        }
    }
}
