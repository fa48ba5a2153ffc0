//! `mirrorbench list` – show mirrors that pass the filter.

use anyhow::Result;
use chrono::Utc;
use mirrorbench_core::config::BenchConfig;
use mirrorbench_core::filter::{filter, FilterCriteria};

use super::source::{apply_countries, load_candidates};
use crate::cli::CatalogArgs;

pub async fn run_list(mut cfg: BenchConfig, catalog: &CatalogArgs) -> Result<()> {
    apply_countries(&mut cfg, catalog);
    let candidates = load_candidates(&cfg, catalog).await?;
    let now = Utc::now();
    let kept = filter(&candidates, &FilterCriteria::from_config(&cfg), now);

    if kept.is_empty() {
        println!("No mirrors passed the filter.");
        return Ok(());
    }
    println!(
        "{:<2}  {:>8}  {:>8}  {:>8}  {}",
        "CC", "Delay(s)", "Sync(m)", "Stddev", "URL"
    );
    for c in &kept {
        let delay = c
            .delay
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let age = c
            .last_sync
            .map(|t| (now - t).num_minutes().max(0).to_string())
            .unwrap_or_else(|| "-".to_string());
        let stddev = c
            .duration_stddev
            .map(|s| format!("{s:.3}"))
            .unwrap_or_else(|| "-".to_string());
        println!("{:<2}  {:>8}  {:>8}  {:>8}  {}", c.country_code, delay, age, stddev, c.url);
    }
    println!("{} of {} mirrors eligible.", kept.len(), candidates.len());
    Ok(())
}
