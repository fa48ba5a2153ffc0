//! Per-candidate running statistics.
//!
//! [`CandidateStats`] owns a candidate's sample and error history and the
//! estimates derived from them. The two sample sequences are only ever
//! appended to together, and estimates are only ever produced by
//! [`CandidateStats::recompute`].

mod estimator;

use std::fmt;
use std::sync::Arc;

use crate::catalog::Candidate;
use crate::prober::{ProbeError, Sample};

pub use estimator::{Estimate, Estimator, OPTIMISTIC_UPPER_BPS};

/// A candidate together with everything measured about it in this run.
#[derive(Debug, Clone)]
pub struct CandidateStats {
    candidate: Arc<Candidate>,
    host: String,
    /// Response body sizes in bytes.
    bytes: Vec<u64>,
    /// Request durations in seconds, parallel to `bytes`.
    secs: Vec<f64>,
    errors: Vec<ProbeError>,
    estimate: Estimate,
    in_flight: bool,
}

impl CandidateStats {
    pub fn new(candidate: Candidate) -> Self {
        let host = candidate.hostname();
        Self {
            candidate: Arc::new(candidate),
            host,
            bytes: Vec::new(),
            secs: Vec::new(),
            errors: Vec::new(),
            estimate: Estimate::default(),
            in_flight: false,
        }
    }

    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn sample_count(&self) -> usize {
        self.bytes.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.bytes
            .iter()
            .zip(&self.secs)
            .map(|(&bytes, &secs)| Sample { bytes, secs })
    }

    pub fn latency_secs(&self) -> Option<f64> {
        self.estimate.latency_secs
    }

    pub fn rate_bps(&self) -> f64 {
        self.estimate.rate_bps
    }

    pub fn rate_bps_upper(&self) -> f64 {
        self.estimate.rate_bps_upper
    }

    #[cfg(test)]
    pub(crate) fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Marks a probe as issued. Returns false if one is already in flight,
    /// in which case the caller must not probe this candidate.
    pub(crate) fn begin_probe(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    /// Clears the in-flight mark and records the probe's result.
    pub(crate) fn finish_probe(&mut self, result: Result<Sample, ProbeError>) {
        self.in_flight = false;
        self.record(result);
    }

    /// Append one probe result. Estimates are stale until [`recompute`](Self::recompute).
    pub fn record(&mut self, result: Result<Sample, ProbeError>) {
        match result {
            Ok(s) => {
                self.bytes.push(s.bytes);
                self.secs.push(s.secs);
            }
            Err(e) => self.errors.push(e),
        }
    }

    pub fn recompute(&mut self, estimator: &Estimator) {
        self.estimate = estimator.estimate(&self.bytes, &self.secs, self.errors.len());
    }
}

impl fmt::Display for CandidateStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<2} mbps={:5.2}..{:5.2} n={:>2} err={} {}",
            self.candidate.country_code,
            self.rate_bps() / 1e6,
            self.rate_bps_upper() / 1e6,
            self.sample_count(),
            self.error_count(),
            self.host
        )
    }
}

/// Sort by upper bound, most promising first. Stable.
pub fn sort_by_upper_desc(stats: &mut [CandidateStats]) {
    stats.sort_by(|a, b| b.rate_bps_upper().total_cmp(&a.rate_bps_upper()));
}

/// Sort by point estimate, fastest first. Stable.
pub fn sort_by_rate_desc(stats: &mut [CandidateStats]) {
    stats.sort_by(|a, b| b.rate_bps().total_cmp(&a.rate_bps()));
}
