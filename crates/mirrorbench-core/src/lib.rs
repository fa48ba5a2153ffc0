//! Adaptive mirror benchmarking: pick the fastest mirror by probing
//! candidates in rounds, spending large transfers only on the most
//! promising survivors.

pub mod config;
pub mod logging;

pub mod catalog;
pub mod filter;
pub mod funnel;
pub mod prober;
pub mod report;
pub mod scheduler;
pub mod stats;
pub mod tier;
