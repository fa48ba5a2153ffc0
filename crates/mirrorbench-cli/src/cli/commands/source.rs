//! Catalog loading shared by `rank` and `list`.

use anyhow::{Context, Result};
use mirrorbench_core::catalog::{self, Candidate};
use mirrorbench_core::config::BenchConfig;

use crate::cli::CatalogArgs;

/// Apply `--country` to the config's region list.
pub(super) fn apply_countries(cfg: &mut BenchConfig, args: &CatalogArgs) {
    if !args.countries.is_empty() {
        cfg.allowed_countries = args
            .countries
            .iter()
            .map(|c| c.trim().to_ascii_uppercase())
            .collect();
    }
}

/// Read the catalog from `--catalog-file`, or fetch it from the configured URL.
pub(super) async fn load_candidates(cfg: &BenchConfig, args: &CatalogArgs) -> Result<Vec<Candidate>> {
    if let Some(path) = &args.catalog_file {
        let data = std::fs::read(path)
            .with_context(|| format!("read catalog file: {}", path.display()))?;
        let candidates = catalog::parse(&data)
            .with_context(|| format!("parse catalog file: {}", path.display()))?;
        tracing::info!(path = %path.display(), mirrors = candidates.len(), "loaded mirror catalog");
        return Ok(candidates);
    }

    let url = cfg.catalog_url.clone();
    let connect_timeout = cfg.connect_timeout();
    let candidates = tokio::task::spawn_blocking({
        let url = url.clone();
        move || catalog::fetch(&url, connect_timeout)
    })
    .await
    .context("catalog fetch task join")?
    .with_context(|| format!("fetch mirror catalog: {url}"))?;
    Ok(candidates)
}
