//! Funnel stages, in the only order they may run.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Filter,
    WarmUp,
    Shortlist,
    Refine,
    Seed,
    Rounds,
    Rank,
    Done,
}

impl Stage {
    /// The stage that follows this one. `Done` is terminal.
    pub fn next(self) -> Stage {
        match self {
            Stage::Filter => Stage::WarmUp,
            Stage::WarmUp => Stage::Shortlist,
            Stage::Shortlist => Stage::Refine,
            Stage::Refine => Stage::Seed,
            Stage::Seed => Stage::Rounds,
            Stage::Rounds => Stage::Rank,
            Stage::Rank | Stage::Done => Stage::Done,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Filter => "filter",
            Stage::WarmUp => "warm-up",
            Stage::Shortlist => "shortlist",
            Stage::Refine => "refine",
            Stage::Seed => "seed",
            Stage::Rounds => "rounds",
            Stage::Rank => "rank",
            Stage::Done => "done",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_only_move_forward() {
        let mut stage = Stage::Filter;
        let mut seen = vec![stage];
        while stage != Stage::Done {
            let next = stage.next();
            assert!(next > stage);
            stage = next;
            seen.push(stage);
        }
        assert_eq!(seen.len(), 8);
        assert_eq!(Stage::Done.next(), Stage::Done);
    }
}
