//! # ffWAR Engine
//!
//! Builds and incrementally maintains the Patriot Center league's statistics
//! caches from Sleeper data:
//!
//! - **starters**: every manager's starting lineup and points per week
//! - **replacement scores**: replacement-level thresholds per position and
//!   their bye-aware 3-year rolling averages
//! - **ffWAR**: per-starter wins above replacement from simulated matchups
//!
//! Each cache is extended week by week through [`orchestrator::run_incremental`]
//! and persisted after every week. [`CachePipeline`] wires the three together.

pub mod cli;
pub mod config;
pub mod error;
pub mod ffwar;
pub mod identity;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod pipeline;
pub mod players;
pub mod replacement;
pub mod starters;

#[cfg(test)]
mod testing;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use models::{
    FfwarCache, FfwarRecord, ManagerWeek, PlayerWeekRecord, Position, ReplacementCache,
    ReplacementWeek, SeasonWeek, StartersCache,
};
pub use pipeline::{CachePipeline, CacheStatus, LeagueCaches};
