//! Error types for the statistics engine

use crate::models::{Position, Season, Week};
use persistence::PersistenceError;
use sleeper_client::SleeperError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Upstream unavailable: {0}")]
    Upstream(#[from] SleeperError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("No league configured for season {season}")]
    UnknownSeason { season: Season },

    #[error("League reported an unreadable season label: {label}")]
    InvalidSeasonLabel { label: String },

    #[error("Only {found} scored {position} players in {season} week {week}, need {required}")]
    InsufficientPlayers { season: Season, week: Week, position: Position, required: usize, found: usize },

    #[error("Playoff round {round} for {season} week {week} is not supported")]
    UnsupportedPlayoffRound { season: Season, week: Week, round: Week },

    #[error("Winners bracket has no rosters for {season} week {week}")]
    NoPlayoffRosters { season: Season, week: Week },

    #[error("Winners bracket for {season} has no first/second/third place result yet")]
    PlacementUnavailable { season: Season },

    #[error("{cache} has no entry for {season} week {week}")]
    MissingUpstreamWeek { cache: &'static str, season: Season, week: Week },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl EngineError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig { message: message.into() }
    }
}
