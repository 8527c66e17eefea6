//! # Sleeper Client
//!
//! Read-only access to the Sleeper fantasy platform: league metadata, users,
//! rosters, weekly matchups, the winners bracket, league-wide weekly NFL stats
//! and the player directory.
//!
//! Builders take a [`StatsSource`]; [`SleeperClient`] is the HTTP
//! implementation.

pub mod client;
pub mod config;
pub mod error;
pub mod models;

pub use client::{SleeperClient, StatsSource};
pub use config::SleeperConfig;
pub use error::{Result, SleeperError};
pub use models::{
    BracketMatch, LeagueInfo, LeagueSettings, PlayerMeta, PlayerStatLine, SleeperMatchup,
    SleeperRoster, SleeperUser, WeeklyStats,
};
