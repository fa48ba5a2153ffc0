//! Multi-stage funnel: filter, warm up, shortlist, refine, seed, schedule, rank.
//!
//! Cheap low-information probes run against every eligible mirror first;
//! expensive probes are reserved for the survivors of each truncation. Stages
//! run strictly in order and a funnel runs once.

mod stage;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::Candidate;
use crate::config::{BenchConfig, FunnelConfig};
use crate::filter::{filter, FilterCriteria};
use crate::prober::Prober;
use crate::scheduler::{probe_and_merge, BatchSummary, Scheduler};
use crate::stats::{sort_by_rate_desc, sort_by_upper_desc, CandidateStats, Estimator};
use crate::tier::Tier;

pub use stage::Stage;

/// Final state of a run.
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// Finalists, fastest point estimate first.
    pub ranked: Vec<CandidateStats>,
    /// Candidates cut at a shortlist, in the order they were cut.
    pub retired: Vec<CandidateStats>,
}

impl RunOutcome {
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Every candidate that was probed in this run.
    pub fn all_stats(&self) -> impl Iterator<Item = &CandidateStats> {
        self.ranked.iter().chain(&self.retired)
    }
}

pub struct Funnel<R> {
    config: FunnelConfig,
    criteria: FilterCriteria,
    estimator: Estimator,
    prober: Prober,
    rng: R,
    stage: Stage,
}

impl<R: Rng> Funnel<R> {
    pub fn new(cfg: &BenchConfig, prober: Prober, rng: R) -> Self {
        Self::with_parts(
            cfg.funnel.clone(),
            FilterCriteria::from_config(cfg),
            Estimator::new(cfg.estimator.clone()),
            prober,
            rng,
        )
    }

    pub fn with_parts(
        config: FunnelConfig,
        criteria: FilterCriteria,
        estimator: Estimator,
        prober: Prober,
        rng: R,
    ) -> Self {
        Self {
            config,
            criteria,
            estimator,
            prober,
            rng,
            stage: Stage::Filter,
        }
    }

    /// Run every stage over `candidates` as of `now`.
    ///
    /// Never fails: probe errors are absorbed into each candidate's stats and
    /// an empty filter result yields an empty outcome.
    pub async fn run(mut self, candidates: &[Candidate], now: DateTime<Utc>) -> RunOutcome {
        let mut outcome = RunOutcome::default();

        let mut pool: Vec<CandidateStats> = filter(candidates, &self.criteria, now)
            .into_iter()
            .map(CandidateStats::new)
            .collect();
        if pool.is_empty() {
            tracing::warn!("no mirrors left after filtering");
            while self.stage != Stage::Done {
                self.advance(0);
            }
            return outcome;
        }

        self.advance(pool.len());
        let (tier, repeats) = (self.config.warmup_tier, self.config.warmup_repeats);
        for rep in 0..repeats {
            if rep > 0 {
                tokio::time::sleep(self.config.warmup_delay()).await;
            }
            self.probe_all(&mut pool, tier).await;
        }

        self.advance(pool.len());
        let keep = self.config.shortlist;
        shortlist(&mut pool, keep, &mut outcome.retired);

        self.advance(pool.len());
        let (tier, rounds) = (self.config.refine_tier, self.config.refine_rounds);
        for _ in 0..rounds {
            self.probe_all(&mut pool, tier).await;
        }
        let keep = self.config.finalists;
        shortlist(&mut pool, keep, &mut outcome.retired);

        self.advance(pool.len());
        let tier = self.config.seed_tier;
        self.probe_all(&mut pool, tier).await;

        self.advance(pool.len());
        let mut scheduler = Scheduler::new();
        scheduler.seed(pool);
        scheduler
            .run_plan(&self.prober, &self.estimator, &self.config.round_plan)
            .await;

        self.advance(scheduler.len());
        let mut ranked = scheduler.into_stats();
        // Point estimate only: exploration terms must not decide the answer.
        sort_by_rate_desc(&mut ranked);
        for s in &ranked {
            tracing::debug!("final {}", s);
        }

        self.advance(ranked.len());
        debug_assert_eq!(self.stage, Stage::Done);
        outcome.ranked = ranked;
        outcome
    }

    /// Move to the next stage. `candidates` is the pool size entering it.
    fn advance(&mut self, candidates: usize) {
        let next = self.stage.next();
        tracing::info!(from = %self.stage, to = %next, candidates, "funnel stage");
        self.stage = next;
    }

    /// One concurrent batch over the whole pool, in a fresh random order.
    async fn probe_all(&mut self, pool: &mut [CandidateStats], tier: Tier) -> BatchSummary {
        pool.shuffle(&mut self.rng);
        let indices: Vec<usize> = (0..pool.len()).collect();
        let summary = probe_and_merge(&self.prober, &self.estimator, pool, &indices, tier).await;
        tracing::info!(
            tier = %tier,
            approx_bytes = tier.approx_bytes(),
            probed = summary.probed,
            failed = summary.failed,
            "batch done"
        );
        summary
    }
}

/// Keep the `keep` most promising candidates by upper bound; move the rest to
/// `retired`. Never asks for more candidates than exist.
fn shortlist(pool: &mut Vec<CandidateStats>, keep: usize, retired: &mut Vec<CandidateStats>) {
    sort_by_upper_desc(pool);
    for s in pool.iter() {
        tracing::debug!("{}", s);
    }
    if pool.len() > keep {
        retired.extend(pool.drain(keep..));
    }
}
