//! CLI for the mirrorbench mirror ranker.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use mirrorbench_core::config::{self, BenchConfig};
use std::path::PathBuf;

use commands::{run_completions, run_list, run_rank, RankOptions};

/// Top-level CLI for mirrorbench.
#[derive(Debug, Parser)]
#[command(name = "mirrorbench")]
#[command(about = "mirrorbench: rank package mirrors by measured throughput", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Where the mirror catalog comes from and which regions to keep.
#[derive(Debug, Clone, Args)]
pub struct CatalogArgs {
    /// Keep only mirrors in this country (ISO code, repeatable). Overrides the config.
    #[arg(long = "country", value_name = "CC")]
    pub countries: Vec<String>,

    /// Read the mirror status JSON from a file instead of fetching it.
    #[arg(long, value_name = "PATH")]
    pub catalog_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Benchmark eligible mirrors and print them fastest first.
    Rank {
        #[command(flatten)]
        catalog: CatalogArgs,

        /// Seed for the probe order. Random when omitted.
        #[arg(long, value_name = "N")]
        seed: Option<u64>,

        /// Candidates kept after the warm-up probes.
        #[arg(long, value_name = "M")]
        shortlist: Option<usize>,

        /// Candidates kept for the scheduled rounds.
        #[arg(long, value_name = "P")]
        finalists: Option<usize>,

        /// Raw sample log (TSV: host, bytes, seconds).
        #[arg(long, default_value = "mirrors.tsv", value_name = "PATH")]
        samples: PathBuf,

        /// Also write a pacman mirrorlist.
        #[arg(long, value_name = "PATH")]
        mirrorlist: Option<PathBuf>,

        /// Number of mirrors in the mirrorlist.
        #[arg(long, default_value = "10", value_name = "N")]
        top: usize,
    },

    /// Show the mirrors that pass the filter, without probing them.
    List {
        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// Print a shell completion script to stdout.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn load_config() -> Result<BenchConfig> {
    let cfg = config::load_or_init()?;
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Rank {
                catalog,
                seed,
                shortlist,
                finalists,
                samples,
                mirrorlist,
                top,
            } => {
                let opts = RankOptions {
                    seed,
                    shortlist,
                    finalists,
                    samples,
                    mirrorlist,
                    top,
                };
                run_rank(load_config()?, &catalog, opts).await?;
            }
            CliCommand::List { catalog } => run_list(load_config()?, &catalog).await?,
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
