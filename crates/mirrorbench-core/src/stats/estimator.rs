//! Throughput estimator: point estimate and optimistic upper bound.
//!
//! Model: `secs ≈ latency + bytes / rate`. Tiny transfers are latency
//! dominated, so they only anchor the intercept and never enter the slope.
//! The upper bound adds two terms that shrink with evidence: the spread of
//! per-sample rates (decaying with sample count) and a cold-start bonus
//! (decaying with total bytes). Both only shape scheduling priority.

use crate::config::EstimatorConfig;

/// Upper bound of a candidate with too few samples to judge.
pub const OPTIMISTIC_UPPER_BPS: f64 = f64::INFINITY;

/// Derived estimates for one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Fastest observed duration; `None` without samples.
    pub latency_secs: Option<f64>,
    /// Point estimate in bytes/sec. Used for the final ranking.
    pub rate_bps: f64,
    /// Optimistic estimate in bytes/sec. Used for scheduling priority.
    pub rate_bps_upper: f64,
}

impl Default for Estimate {
    fn default() -> Self {
        Self {
            latency_secs: None,
            rate_bps: 0.0,
            rate_bps_upper: OPTIMISTIC_UPPER_BPS,
        }
    }
}

/// Pure estimator over a candidate's sample sequences.
#[derive(Debug, Clone, Default)]
pub struct Estimator {
    cfg: EstimatorConfig,
}

impl Estimator {
    pub fn new(cfg: EstimatorConfig) -> Self {
        Self { cfg }
    }

    /// Estimate from parallel `bytes`/`secs` sequences and the number of failed probes.
    pub fn estimate(&self, bytes: &[u64], secs: &[f64], errors: usize) -> Estimate {
        debug_assert_eq!(bytes.len(), secs.len());
        let n = bytes.len().min(secs.len());
        let (bytes, secs) = (&bytes[..n], &secs[..n]);

        let latency_secs = secs.iter().copied().reduce(f64::min);

        if n < 2 {
            let rate_bps_upper = if errors > 0 && self.cfg.failure_penalty {
                0.0
            } else {
                OPTIMISTIC_UPPER_BPS
            };
            return Estimate {
                latency_secs,
                rate_bps: 0.0,
                rate_bps_upper,
            };
        }

        let rate_bps = self.point_estimate(bytes, secs);
        let mut exploration = self.uncertainty(bytes, secs, rate_bps) + self.cold_start_bonus(bytes);
        // Failures shrink the optimism, never the measured rate itself.
        if self.cfg.failure_penalty {
            exploration *= n as f64 / (n + errors) as f64;
        }
        let rate_bps_upper = rate_bps + exploration;

        Estimate {
            latency_secs,
            rate_bps,
            rate_bps_upper,
        }
    }

    /// Slope fit over qualifying samples, or the ratio of the largest sample
    /// when fewer than two qualify.
    pub fn point_estimate(&self, bytes: &[u64], secs: &[f64]) -> f64 {
        let qualifying = bytes.iter().filter(|&&b| b > self.cfg.min_fit_bytes).count();
        if qualifying >= 2 {
            if let Some(rate) = self.fit_rate(bytes, secs) {
                return rate;
            }
        }
        largest_sample_rate(bytes, secs)
    }

    /// Least-squares slope of `secs - intercept` against `bytes` through the
    /// origin, over qualifying samples. The intercept is the fastest
    /// non-qualifying (latency) sample, never above the fastest qualifying one.
    fn fit_rate(&self, bytes: &[u64], secs: &[f64]) -> Option<f64> {
        let min_fit = self.cfg.min_fit_bytes;
        let pairs = || bytes.iter().copied().zip(secs.iter().copied());

        let fastest_fit = pairs()
            .filter(|&(b, _)| b > min_fit)
            .map(|(_, s)| s)
            .reduce(f64::min)?;
        let intercept = pairs()
            .filter(|&(b, _)| b <= min_fit)
            .map(|(_, s)| s)
            .reduce(f64::min)
            .unwrap_or(0.0)
            .min(fastest_fit);

        let (num, den) = pairs()
            .filter(|&(b, _)| b > min_fit)
            .fold((0.0, 0.0), |(num, den), (b, s)| {
                let x = b as f64;
                (num + x * (s - intercept), den + x * x)
            });
        let slope = num / den;
        if slope > 0.0 && slope.is_finite() {
            Some(1.0 / slope)
        } else {
            None
        }
    }

    /// `weight * stddev(per-sample rate - rate) / n^exponent`. Needs `n >= 2`.
    fn uncertainty(&self, bytes: &[u64], secs: &[f64], rate: f64) -> f64 {
        let n = bytes.len();
        let sum_sq: f64 = bytes
            .iter()
            .zip(secs)
            .map(|(&b, &s)| {
                let r = if s > 0.0 { b as f64 / s } else { 0.0 };
                (r - rate) * (r - rate)
            })
            .sum();
        let variance = sum_sq / (n - 1) as f64;
        self.cfg.uncertainty_weight * variance.sqrt() / (n as f64).powf(self.cfg.uncertainty_exponent)
    }

    /// `scale / total_bytes^exponent`: large while only tiny payloads have
    /// been seen, vanishing once real volume has been transferred.
    fn cold_start_bonus(&self, bytes: &[u64]) -> f64 {
        let total = bytes.iter().sum::<u64>().max(1) as f64;
        self.cfg.bonus_scale / total.powf(self.cfg.bonus_exponent)
    }
}

/// bytes/secs of the sample with the most bytes (the latest one on ties).
fn largest_sample_rate(bytes: &[u64], secs: &[f64]) -> f64 {
    bytes
        .iter()
        .zip(secs)
        .max_by_key(|pair| *pair.0)
        .map(|(&b, &s)| if s > 0.0 { b as f64 / s } else { 0.0 })
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn est() -> Estimator {
        Estimator::default()
    }

    #[test]
    fn no_samples_keeps_defaults() {
        let e = est().estimate(&[], &[], 0);
        assert_eq!(e, Estimate::default());
    }

    #[test]
    fn single_sample_keeps_point_estimate_at_zero() {
        let e = est().estimate(&[8_000_000], &[1.0], 0);
        assert_eq!(e.rate_bps, 0.0);
        assert_eq!(e.rate_bps_upper, OPTIMISTIC_UPPER_BPS);
        assert_eq!(e.latency_secs, Some(1.0));
    }

    #[test]
    fn failing_candidate_without_samples_is_not_optimistic() {
        let e = est().estimate(&[], &[], 3);
        assert_eq!(e.rate_bps, 0.0);
        assert_eq!(e.rate_bps_upper, 0.0);

        let lenient = Estimator::new(EstimatorConfig {
            failure_penalty: false,
            ..EstimatorConfig::default()
        });
        assert_eq!(lenient.estimate(&[], &[], 3).rate_bps_upper, OPTIMISTIC_UPPER_BPS);
    }

    #[test]
    fn one_qualifying_sample_uses_its_ratio() {
        let e = est().estimate(&[500, 2_000_000], &[0.05, 0.20], 0);
        assert!((e.rate_bps - 10_000_000.0).abs() < 1e-6);
        assert_eq!(e.latency_secs, Some(0.05));
        assert!(e.rate_bps_upper > e.rate_bps);
    }

    #[test]
    fn fit_recovers_rate_through_latency_intercept() {
        // latency 50 ms, 2 MB/s
        let bytes = [10, 10, 1_000_000, 4_000_000, 8_000_000];
        let secs: Vec<f64> = bytes.iter().map(|&b| 0.05 + b as f64 / 2.0e6).collect();
        let e = est().estimate(&bytes, &secs, 0);
        assert!((e.rate_bps - 2.0e6).abs() / 2.0e6 < 1e-3, "rate {}", e.rate_bps);
        assert!(e.latency_secs.unwrap() < 0.0501);
    }

    #[test]
    fn fit_without_latency_samples_uses_zero_intercept() {
        let bytes = [1_000_000, 3_000_000];
        let secs = [0.5, 1.5];
        let e = est().estimate(&bytes, &secs, 0);
        assert!((e.rate_bps - 2.0e6).abs() < 1.0);
    }

    #[test]
    fn errors_shrink_exploration_but_not_below_the_point_estimate() {
        let bytes = [500, 2_000_000, 2_000_000];
        let secs = [0.05, 0.2, 0.25];
        let clean = est().estimate(&bytes, &secs, 0);
        let flaky = est().estimate(&bytes, &secs, 3);
        assert_eq!(clean.rate_bps, flaky.rate_bps);
        let clean_extra = clean.rate_bps_upper - clean.rate_bps;
        let flaky_extra = flaky.rate_bps_upper - flaky.rate_bps;
        assert!((flaky_extra - clean_extra * 0.5).abs() < 1e-3);
        assert!(flaky.rate_bps_upper >= flaky.rate_bps);
    }

    #[test]
    fn many_errors_keep_upper_bound_at_or_above_rate() {
        let bytes = [8_200_000u64; 10];
        let secs = [0.82; 10];
        let e = est().estimate(&bytes, &secs, 10);
        assert!((e.rate_bps - 10_000_000.0).abs() < 1.0);
        assert!(e.rate_bps_upper >= e.rate_bps, "{} < {}", e.rate_bps_upper, e.rate_bps);
    }

    #[test]
    fn cold_start_bonus_never_grows_with_more_bytes() {
        let e = est();
        let mut bytes = vec![10u64];
        let mut last = e.cold_start_bonus(&bytes);
        for b in [10, 120_000, 1_400_000, 8_200_000, 8_200_000] {
            bytes.push(b);
            let bonus = e.cold_start_bonus(&bytes);
            assert!(bonus <= last);
            last = bonus;
        }
        assert!(e.cold_start_bonus(&[0, 0]).is_finite());
    }

    #[test]
    fn zero_duration_samples_do_not_divide_by_zero() {
        let e = est().estimate(&[100, 200], &[0.0, 0.0], 0);
        assert!(e.rate_bps.is_finite());
        assert!(e.rate_bps_upper.is_finite());
    }
}
