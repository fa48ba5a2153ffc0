//! One probe batch: fan out, join all, then merge into candidate stats.

use crate::prober::{ProbeRequest, Prober};
use crate::stats::{CandidateStats, Estimator};
use crate::tier::Tier;

/// Counts for one completed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub probed: usize,
    pub failed: usize,
}

/// Probes `stats[i]` for every `i` in `indices` at `tier`, concurrently.
///
/// Results are merged and estimates recomputed only after every probe in the
/// batch has finished. Candidates already in flight are skipped.
pub async fn probe_and_merge(
    prober: &Prober,
    estimator: &Estimator,
    stats: &mut [CandidateStats],
    indices: &[usize],
    tier: Tier,
) -> BatchSummary {
    let mut requests = Vec::with_capacity(indices.len());
    for &i in indices {
        let Some(s) = stats.get_mut(i) else {
            continue;
        };
        if !s.begin_probe() {
            tracing::warn!(host = s.host(), "probe already in flight, skipped");
            continue;
        }
        requests.push(ProbeRequest {
            id: i,
            base_url: s.candidate().url.clone(),
        });
    }

    let outcomes = prober.probe_batch(requests, tier).await;

    let mut summary = BatchSummary::default();
    for outcome in outcomes {
        let s = &mut stats[outcome.id];
        summary.probed += 1;
        if outcome.result.is_err() {
            summary.failed += 1;
        }
        s.finish_probe(outcome.result);
        s.recompute(estimator);
    }
    summary
}
