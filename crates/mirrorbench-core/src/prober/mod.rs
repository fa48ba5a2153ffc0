//! Timed probes against candidate mirrors.
//!
//! The [`Fetch`] trait is the single blocking fetch primitive; [`CurlFetcher`]
//! is the production implementation. [`Prober`] turns a batch of
//! `(candidate, tier)` requests into concurrent blocking tasks and joins them
//! all before returning, so each probe owns its result until the batch is done.

mod fetcher;
mod error;

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::tier::{Tier, TierPaths};

pub use fetcher::CurlFetcher;
pub use error::ProbeError;

/// One successful probe: body bytes received and wall-clock seconds from
/// request start until the body was fully read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub bytes: u64,
    pub secs: f64,
}

/// Blocking fetch of a whole resource, timed.
pub trait Fetch: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> Result<Sample, ProbeError>;
}

/// One entry of a probe batch. `id` is opaque to the prober and echoed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub id: usize,
    pub base_url: String,
}

/// Result of one probe in a batch.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub id: usize,
    pub result: Result<Sample, ProbeError>,
}

/// Issues probes of a given tier against candidate base URLs.
#[derive(Clone)]
pub struct Prober {
    fetcher: Arc<dyn Fetch>,
    tiers: TierPaths,
}

impl Prober {
    pub fn new(fetcher: Arc<dyn Fetch>, tiers: TierPaths) -> Self {
        Self { fetcher, tiers }
    }

    /// Probe a single candidate.
    pub async fn probe(&self, base_url: &str, tier: Tier) -> Result<Sample, ProbeError> {
        let mut outcomes = self
            .probe_batch(
                vec![ProbeRequest {
                    id: 0,
                    base_url: base_url.to_string(),
                }],
                tier,
            )
            .await;
        outcomes
            .pop()
            .map(|o| o.result)
            .unwrap_or_else(|| Err(ProbeError::Task("no outcome".to_string())))
    }

    /// Probe every request concurrently and wait for all of them.
    ///
    /// Returns exactly one outcome per distinct request id, in completion
    /// order. A failing or panicking probe only affects its own outcome.
    /// Requests repeating an id already in the batch are not issued.
    pub async fn probe_batch(&self, requests: Vec<ProbeRequest>, tier: Tier) -> Vec<ProbeOutcome> {
        let mut pending: HashSet<usize> = HashSet::with_capacity(requests.len());
        let mut join_set = tokio::task::JoinSet::new();

        for req in requests {
            if !pending.insert(req.id) {
                tracing::warn!(id = req.id, "duplicate probe request in batch, skipped");
                continue;
            }
            let url = self.tiers.url_for(&req.base_url, tier);
            let fetcher = Arc::clone(&self.fetcher);
            join_set.spawn_blocking(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| fetcher.fetch(&url)))
                    .unwrap_or_else(|_| Err(ProbeError::Task(format!("fetch of {url} panicked"))));
                match &result {
                    Ok(s) => tracing::debug!(%url, bytes = s.bytes, secs = s.secs, "probe ok"),
                    Err(e) => tracing::warn!(%url, error = %e, "probe failed"),
                }
                ProbeOutcome { id: req.id, result }
            });
        }

        let mut outcomes = Vec::with_capacity(pending.len());
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(outcome) => {
                    pending.remove(&outcome.id);
                    outcomes.push(outcome);
                }
                Err(e) => tracing::warn!(error = %e, "probe task join failed"),
            }
        }
        // Tasks lost to cancellation still owe their candidate an outcome.
        for id in pending {
            outcomes.push(ProbeOutcome {
                id,
                result: Err(ProbeError::Task("cancelled".to_string())),
            });
        }
        outcomes
    }
}
