//! `mirrorbench rank` – benchmark the filtered catalog and print a ranking.

use anyhow::{Context, Result};
use chrono::Utc;
use mirrorbench_core::config::BenchConfig;
use mirrorbench_core::funnel::Funnel;
use mirrorbench_core::prober::{CurlFetcher, Prober};
use mirrorbench_core::report;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use super::source::{apply_countries, load_candidates};
use crate::cli::CatalogArgs;

#[derive(Debug)]
pub struct RankOptions {
    pub seed: Option<u64>,
    pub shortlist: Option<usize>,
    pub finalists: Option<usize>,
    pub samples: PathBuf,
    pub mirrorlist: Option<PathBuf>,
    pub top: usize,
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

pub async fn run_rank(mut cfg: BenchConfig, catalog: &CatalogArgs, opts: RankOptions) -> Result<()> {
    apply_countries(&mut cfg, catalog);
    if let Some(m) = opts.shortlist {
        cfg.funnel.shortlist = m;
    }
    if let Some(p) = opts.finalists {
        cfg.funnel.finalists = p;
    }
    cfg.validate().context("invalid options")?;

    let candidates = load_candidates(&cfg, catalog).await?;

    let fetcher = CurlFetcher::new(cfg.connect_timeout(), cfg.read_timeout());
    let prober = Prober::new(Arc::new(fetcher), cfg.tiers.clone());
    let rng = match opts.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };

    let outcome = Funnel::new(&cfg, prober, rng)
        .run(&candidates, Utc::now())
        .await;

    if outcome.is_empty() {
        println!("No mirrors passed the filter.");
    } else {
        let mut out = io::stdout().lock();
        report::write_ranking(&mut out, &outcome.ranked)?;
        out.flush()?;
    }

    let mut w = create(&opts.samples)?;
    report::write_samples(&mut w, outcome.all_stats())?;
    w.flush()?;
    tracing::info!(path = %opts.samples.display(), "wrote sample log");

    if let Some(path) = &opts.mirrorlist {
        let mut w = create(path)?;
        report::write_mirrorlist(&mut w, &outcome.ranked, opts.top)?;
        w.flush()?;
        println!("Mirrorlist written to {}", path.display());
    }
    Ok(())
}
