//! Output writers: ranked report, raw sample log, pacman mirrorlist.

use std::io::{self, Write};

use crate::stats::CandidateStats;

/// Human-readable ranking, one row per candidate in the given order.
pub fn write_ranking<W: Write>(w: &mut W, ranked: &[CandidateStats]) -> io::Result<()> {
    writeln!(
        w,
        "{:>4}  {:<2}  {:>8}  {:>8}  {:>8}  {:>3}  {:>3}  {}",
        "Rank", "CC", "Lat(ms)", "MB/s", "Upper", "N", "Err", "Endpoint"
    )?;
    writeln!(
        w,
        "{}  {}  {}  {}  {}  {}  {}  {}",
        "----", "--", "--------", "--------", "--------", "---", "---", "--------"
    )?;
    for (rank, s) in ranked.iter().enumerate() {
        let latency = s
            .latency_secs()
            .map(|l| format!("{:.1}", l * 1000.0))
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            w,
            "{:>4}  {:<2}  {:>8}  {:>8.2}  {:>8.2}  {:>3}  {:>3}  {}",
            rank + 1,
            s.candidate().country_code,
            latency,
            s.rate_bps() / 1e6,
            s.rate_bps_upper() / 1e6,
            s.sample_count(),
            s.error_count(),
            s.candidate().url
        )?;
    }
    Ok(())
}

/// Raw samples as TSV: `host\tlen\tdt_secs`, one line per successful probe.
pub fn write_samples<'a, W, I>(w: &mut W, stats: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a CandidateStats>,
{
    writeln!(w, "host\tlen\tdt_secs")?;
    for s in stats {
        for sample in s.samples() {
            writeln!(w, "{}\t{}\t{:.5}", s.host(), sample.bytes, sample.secs)?;
        }
    }
    Ok(())
}

/// pacman mirrorlist for the first `limit` candidates with a measured rate.
pub fn write_mirrorlist<W: Write>(
    w: &mut W,
    ranked: &[CandidateStats],
    limit: usize,
) -> io::Result<()> {
    for s in ranked.iter().filter(|s| s.rate_bps() > 0.0).take(limit) {
        let url = &s.candidate().url;
        let sep = if url.ends_with('/') { "" } else { "/" };
        writeln!(w, "# {:.1} MB/s", s.rate_bps() / 1e6)?;
        writeln!(w, "Server = {url}{sep}$repo/os/$arch")?;
    }
    Ok(())
}
