//! Explore/exploit scheduler over the shortlisted candidates.
//!
//! Candidates live in an owned arena; a max-heap holds `(upper bound, index)`
//! keys. Each round pops the top `batch` entries, probes them concurrently,
//! recomputes their estimates and pushes them back with their new keys. A
//! candidate is never in the heap while its stats change, so heap order is
//! always consistent with current scores.

mod queue;
mod round;

use std::collections::BinaryHeap;

use crate::config::RoundPlanEntry;
use crate::prober::Prober;
use crate::stats::{CandidateStats, Estimator};
use crate::tier::Tier;

use queue::QueueEntry;

pub use round::{probe_and_merge, BatchSummary};

#[derive(Debug, Default)]
pub struct Scheduler {
    stats: Vec<CandidateStats>,
    queue: BinaryHeap<QueueEntry>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add candidates to the arena and queue them at their current upper bound.
    pub fn seed(&mut self, candidates: impl IntoIterator<Item = CandidateStats>) {
        for s in candidates {
            let index = self.stats.len();
            self.stats.push(s);
            self.push(index);
        }
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Remove up to `k` highest-priority entries. The caller owns them until
    /// it hands them back with [`requeue`](Self::requeue).
    pub fn pop_top(&mut self, k: usize) -> Vec<usize> {
        let mut popped = Vec::with_capacity(k.min(self.queue.len()));
        while popped.len() < k {
            let Some(entry) = self.queue.pop() else {
                break;
            };
            popped.push(entry.index);
        }
        popped
    }

    /// Queue previously popped candidates again at their current upper bound.
    pub fn requeue(&mut self, indices: &[usize]) {
        for &index in indices {
            self.push(index);
        }
    }

    fn push(&mut self, index: usize) {
        let upper = self.stats[index].rate_bps_upper();
        self.queue.push(QueueEntry { upper, index });
    }

    /// One explore/exploit step: probe the `batch_size` most promising
    /// candidates at `tier` and requeue them at their new scores.
    pub async fn run_round(
        &mut self,
        prober: &Prober,
        estimator: &Estimator,
        tier: Tier,
        batch_size: usize,
    ) -> BatchSummary {
        let popped = self.pop_top(batch_size);
        let hosts: Vec<&str> = popped.iter().map(|&i| self.stats[i].host()).collect();
        tracing::info!(
            tier = %tier,
            approx_bytes = tier.approx_bytes(),
            ?hosts,
            "scheduler round"
        );
        for &i in &popped {
            tracing::debug!(tier = %tier, "probing {}", self.stats[i]);
        }
        let summary = probe_and_merge(prober, estimator, &mut self.stats, &popped, tier).await;
        for &i in &popped {
            tracing::debug!(tier = %tier, "probed  {}", self.stats[i]);
        }
        self.requeue(&popped);
        summary
    }

    /// Run every round of `plan` in order.
    pub async fn run_plan(
        &mut self,
        prober: &Prober,
        estimator: &Estimator,
        plan: &[RoundPlanEntry],
    ) {
        for entry in plan {
            for round in 0..entry.rounds {
                let summary = self
                    .run_round(prober, estimator, entry.tier, entry.batch)
                    .await;
                tracing::info!(
                    tier = %entry.tier,
                    round,
                    probed = summary.probed,
                    failed = summary.failed,
                    "scheduler round done"
                );
            }
        }
    }

    pub fn into_stats(self) -> Vec<CandidateStats> {
        self.stats
    }
}
