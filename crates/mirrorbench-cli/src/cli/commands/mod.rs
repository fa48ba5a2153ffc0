//! CLI command handlers, one file per command.

mod completions;
mod list;
mod rank;
mod source;

pub use completions::run_completions;
pub use list::run_list;
pub use rank::{run_rank, RankOptions};
