use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::DEFAULT_CATALOG_URL;
use crate::tier::{Tier, TierPaths};

/// One stage of scheduler rounds: `rounds` rounds of `batch` probes at `tier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundPlanEntry {
    pub tier: Tier,
    pub rounds: usize,
    pub batch: usize,
}

/// Funnel stage sizes and tiers (`[funnel]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunnelConfig {
    /// Tier probed against every filtered candidate during warm-up.
    pub warmup_tier: Tier,
    /// Number of warm-up batches (1-3 is sensible).
    pub warmup_repeats: usize,
    /// Pause before each warm-up batch after the first, in milliseconds.
    pub warmup_delay_ms: u64,
    /// Candidates kept after warm-up (M).
    pub shortlist: usize,
    pub refine_tier: Tier,
    pub refine_rounds: usize,
    /// Candidates kept after the refine stage (P).
    pub finalists: usize,
    /// Tier of the single seeding probe before scheduler rounds.
    pub seed_tier: Tier,
    pub round_plan: Vec<RoundPlanEntry>,
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            warmup_tier: Tier::Tiny,
            warmup_repeats: 3,
            warmup_delay_ms: 100,
            shortlist: 30,
            refine_tier: Tier::Small,
            refine_rounds: 2,
            finalists: 15,
            seed_tier: Tier::Medium,
            round_plan: vec![
                RoundPlanEntry {
                    tier: Tier::Medium,
                    rounds: 15,
                    batch: 5,
                },
                RoundPlanEntry {
                    tier: Tier::Large,
                    rounds: 8,
                    batch: 3,
                },
                RoundPlanEntry {
                    tier: Tier::Large,
                    rounds: 5,
                    batch: 2,
                },
            ],
        }
    }
}

impl FunnelConfig {
    pub fn warmup_delay(&self) -> Duration {
        Duration::from_millis(self.warmup_delay_ms)
    }
}

/// Throughput estimator tuning (`[estimator]` section in config.toml).
///
/// The uncertainty and cold-start terms only shape scheduling priority; they
/// never enter the point estimate used for the final ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Samples at or below this many bytes are latency dominated and excluded from the fit.
    pub min_fit_bytes: u64,
    /// Weight of the residual standard deviation in the upper bound.
    pub uncertainty_weight: f64,
    /// The uncertainty term decays as `n^-uncertainty_exponent`.
    pub uncertainty_exponent: f64,
    /// Cold-start bonus numerator, in bytes/sec.
    pub bonus_scale: f64,
    /// The bonus decays as `total_bytes^-bonus_exponent`.
    pub bonus_exponent: f64,
    /// Scale the exploration terms of the upper bound by the success fraction of all probes.
    pub failure_penalty: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            min_fit_bytes: 16 * 1024,
            uncertainty_weight: 25.0,
            uncertainty_exponent: 1.0,
            bonus_scale: 500.0e6,
            bonus_exponent: 0.5,
            failure_penalty: true,
        }
    }
}

/// Global configuration loaded from `~/.config/mirrorbench/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Mirror status JSON endpoint.
    pub catalog_url: String,
    /// Country codes a mirror must be in. Empty allows every country.
    pub allowed_countries: Vec<String>,
    /// Maximum average mirroring delay in seconds.
    pub max_delay_secs: u64,
    /// Maximum time since the mirror's last sync, in seconds.
    pub max_sync_age_secs: u64,
    pub connect_timeout_secs: u64,
    /// A probe fails when the transfer stalls for this long.
    pub read_timeout_secs: u64,
    pub tiers: TierPaths,
    pub funnel: FunnelConfig,
    pub estimator: EstimatorConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            allowed_countries: ["NL", "BE", "DE", "DK", "SE", "NO"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_delay_secs: 3600,
            max_sync_age_secs: 90 * 60,
            connect_timeout_secs: 3,
            read_timeout_secs: 5,
            tiers: TierPaths::default(),
            funnel: FunnelConfig::default(),
            estimator: EstimatorConfig::default(),
        }
    }
}

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("tier {0} has an empty resource path")]
    EmptyTierPath(Tier),
    #[error("funnel.{0} must be at least 1")]
    ZeroStage(&'static str),
    #[error("round plan entry {index} must have at least one round and a batch of at least 1")]
    EmptyRound { index: usize },
    #[error("round plan entry {index} probes {tier} after a larger tier")]
    TierDecreases { index: usize, tier: Tier },
    #[error("round plan entry {index} widens the batch to {batch}")]
    BatchIncreases { index: usize, batch: usize },
    #[error("estimator.{0} must be a finite, non-negative number")]
    BadEstimator(&'static str),
}

impl BenchConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Check funnel shape and estimator constants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for tier in Tier::ALL {
            if self.tiers.path(tier).trim().is_empty() {
                return Err(ConfigError::EmptyTierPath(tier));
            }
        }

        let f = &self.funnel;
        if f.warmup_repeats == 0 {
            return Err(ConfigError::ZeroStage("warmup_repeats"));
        }
        if f.shortlist == 0 {
            return Err(ConfigError::ZeroStage("shortlist"));
        }
        if f.finalists == 0 {
            return Err(ConfigError::ZeroStage("finalists"));
        }

        let mut prev: Option<RoundPlanEntry> = None;
        for (index, entry) in f.round_plan.iter().enumerate() {
            if entry.rounds == 0 || entry.batch == 0 {
                return Err(ConfigError::EmptyRound { index });
            }
            if let Some(p) = prev {
                if entry.tier < p.tier {
                    return Err(ConfigError::TierDecreases {
                        index,
                        tier: entry.tier,
                    });
                }
                if entry.batch > p.batch {
                    return Err(ConfigError::BatchIncreases {
                        index,
                        batch: entry.batch,
                    });
                }
            }
            prev = Some(*entry);
        }

        let e = &self.estimator;
        let checks = [
            ("uncertainty_weight", e.uncertainty_weight),
            ("uncertainty_exponent", e.uncertainty_exponent),
            ("bonus_scale", e.bonus_scale),
            ("bonus_exponent", e.bonus_exponent),
        ];
        for (name, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::BadEstimator(name));
            }
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mirrorbench")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<BenchConfig> {
    load_or_init_at(&config_path()?)
}

/// Like [`load_or_init`], for an explicit config file path.
pub fn load_or_init_at(path: &Path) -> Result<BenchConfig> {
    if !path.exists() {
        let default_cfg = BenchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: BenchConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(cfg)
}
