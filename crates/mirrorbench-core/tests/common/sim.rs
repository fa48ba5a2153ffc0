//! Simulated mirrors: deterministic latency and throughput with bounded noise.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mirrorbench_core::catalog::{Candidate, Protocol};
use mirrorbench_core::prober::{Fetch, ProbeError, Sample};
use mirrorbench_core::tier::{Tier, TierPaths};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Simulated payload size of each tier. Tiny stays below the fit threshold.
pub fn sim_bytes(tier: Tier) -> u64 {
    match tier {
        Tier::Tiny => 8_192,
        Tier::Small => 131_072,
        Tier::Medium => 1_400_000,
        Tier::Large => 8_200_000,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MirrorProfile {
    pub latency_secs: f64,
    pub rate_bps: f64,
    pub fails: bool,
}

impl MirrorProfile {
    pub fn new(latency_secs: f64, rate_bps: f64) -> Self {
        Self {
            latency_secs,
            rate_bps,
            fails: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            latency_secs: 0.0,
            rate_bps: 0.0,
            fails: true,
        }
    }
}

/// Fetcher answering from per-host profiles. Durations are
/// `(latency + bytes / rate) * (1 + noise * u)` with `u` uniform in [-1, 1].
pub struct SimulatedFetcher {
    profiles: HashMap<String, MirrorProfile>,
    tiers: TierPaths,
    noise: f64,
    rng: Mutex<SmallRng>,
    in_flight: Mutex<HashSet<String>>,
    pub overlapping: AtomicUsize,
    pub calls: AtomicUsize,
}

impl SimulatedFetcher {
    pub fn new(profiles: HashMap<String, MirrorProfile>, noise: f64, seed: u64) -> Self {
        Self {
            profiles,
            tiers: TierPaths::default(),
            noise,
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
            in_flight: Mutex::new(HashSet::new()),
            overlapping: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    fn tier_of(&self, url: &str) -> Option<Tier> {
        Tier::ALL
            .into_iter()
            .find(|&t| url.ends_with(self.tiers.path(t)))
    }
}

impl Fetch for SimulatedFetcher {
    fn fetch(&self, url: &str) -> Result<Sample, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();

        if !self.in_flight.lock().unwrap().insert(host.clone()) {
            self.overlapping.fetch_add(1, Ordering::SeqCst);
        }
        // Give concurrent probes to the same host a chance to overlap.
        std::thread::sleep(Duration::from_millis(1));
        let result = self.answer(&host, url);
        self.in_flight.lock().unwrap().remove(&host);
        result
    }
}

impl SimulatedFetcher {
    fn answer(&self, host: &str, url: &str) -> Result<Sample, ProbeError> {
        let profile = self
            .profiles
            .get(host)
            .ok_or_else(|| ProbeError::Connect(format!("unknown host {host}")))?;
        if profile.fails {
            return Err(ProbeError::Timeout(format!("{host} never answers")));
        }
        let tier = self.tier_of(url).ok_or(ProbeError::Status(404))?;
        let bytes = sim_bytes(tier);
        let u: f64 = self.rng.lock().unwrap().random_range(-1.0..=1.0);
        let secs = (profile.latency_secs + bytes as f64 / profile.rate_bps) * (1.0 + self.noise * u);
        Ok(Sample { bytes, secs })
    }
}

pub fn host(i: usize) -> String {
    format!("m{i:02}.example")
}

/// An eligible, fresh candidate for `host`.
pub fn candidate(host: &str, now: DateTime<Utc>) -> Candidate {
    Candidate {
        url: format!("https://{host}/archlinux/"),
        protocol: Protocol::Https,
        country: "Germany".to_string(),
        country_code: "DE".to_string(),
        last_sync: Some(now - chrono::Duration::minutes(10)),
        completion_pct: Some(1.0),
        delay: Some(300),
        duration_avg: Some(0.2),
        duration_stddev: Some(0.05),
        score: Some(1.5),
        active: true,
        ipv4: true,
        ipv6: true,
        isos: true,
        details: None,
    }
}
