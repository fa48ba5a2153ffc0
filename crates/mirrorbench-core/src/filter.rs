//! Eligibility filter applied to the catalog before any probing.
//!
//! Pure and deterministic given `now`: the same candidates, criteria and
//! clock always yield the same survivors in the same order.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::catalog::Candidate;
use crate::config::BenchConfig;

/// Eligibility criteria for a candidate mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Uppercase country codes. Empty allows every country.
    pub allowed_countries: BTreeSet<String>,
    /// Average mirroring delay must be strictly below this.
    pub max_delay: Duration,
    /// Time since the last sync must be strictly below this.
    pub max_sync_age: Duration,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            allowed_countries: BTreeSet::new(),
            max_delay: Duration::from_secs(3600),
            max_sync_age: Duration::from_secs(90 * 60),
        }
    }
}

impl FilterCriteria {
    pub fn from_config(cfg: &BenchConfig) -> Self {
        Self {
            allowed_countries: cfg
                .allowed_countries
                .iter()
                .map(|c| c.trim().to_ascii_uppercase())
                .filter(|c| !c.is_empty())
                .collect(),
            max_delay: Duration::from_secs(cfg.max_delay_secs),
            max_sync_age: Duration::from_secs(cfg.max_sync_age_secs),
        }
    }

    /// Static checks: secure transport, fully complete, active, allowed region.
    pub fn is_eligible(&self, c: &Candidate) -> bool {
        c.active
            && c.protocol.is_secure()
            && c.completion_pct == Some(1.0)
            && (self.allowed_countries.is_empty()
                || self
                    .allowed_countries
                    .contains(&c.country_code.to_ascii_uppercase()))
    }

    /// Freshness checks: low average delay and a recent last sync.
    pub fn is_fresh(&self, c: &Candidate, now: DateTime<Utc>) -> bool {
        let delay_ok = matches!(c.delay, Some(d) if d >= 0 && (d as u64) < self.max_delay.as_secs());
        let sync_ok = match c.last_sync {
            // A sync timestamp in the future counts as age zero.
            Some(t) => (now - t).num_seconds() < self.max_sync_age.as_secs() as i64,
            None => false,
        };
        delay_ok && sync_ok
    }

    pub fn accepts(&self, c: &Candidate, now: DateTime<Utc>) -> bool {
        self.is_eligible(c) && self.is_fresh(c, now)
    }
}

/// Returns the candidates that pass `criteria` at `now`, ordered by the
/// status checker's duration stddev (most consistent first, unknown last).
pub fn filter(
    candidates: &[Candidate],
    criteria: &FilterCriteria,
    now: DateTime<Utc>,
) -> Vec<Candidate> {
    let mut kept: Vec<Candidate> = candidates
        .iter()
        .filter(|c| criteria.accepts(c, now))
        .cloned()
        .collect();
    kept.sort_by(|a, b| {
        let a = a.duration_stddev.unwrap_or(f64::INFINITY);
        let b = b.duration_stddev.unwrap_or(f64::INFINITY);
        a.total_cmp(&b)
    });
    tracing::info!(
        total = candidates.len(),
        kept = kept.len(),
        "filtered mirror catalog"
    );
    kept
}
