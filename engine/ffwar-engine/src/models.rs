//! Typed cache records
//!
//! Every cache shares the same outer shape, [`SeasonWeekMap`]: season →
//! week → payload. The payload types serialize to the same field names the
//! league website has always read (`Total_Points`, `QB_3yr_avg`, `ffWAR`).

use bigdecimal::{BigDecimal, FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub type Season = i32;
pub type Week = u32;
pub type ManagerName = String;
pub type PlayerName = String;

/// season → week → payload
pub type SeasonWeekMap<T> = BTreeMap<Season, BTreeMap<Week, T>>;

/// Look up one week of a cache
pub fn week_entry<T>(map: &SeasonWeekMap<T>, season: Season, week: Week) -> Option<&T> {
    map.get(&season).and_then(|weeks| weeks.get(&week))
}

/// Number of weeks stored across all seasons
pub fn week_count<T>(map: &SeasonWeekMap<T>) -> usize {
    map.values().map(BTreeMap::len).sum()
}

/// A (season, week) coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeasonWeek {
    pub season: Season,
    pub week: Week,
}

impl SeasonWeek {
    pub fn new(season: Season, week: Week) -> Self {
        Self { season, week }
    }
}

impl fmt::Display for SeasonWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} week {}", self.season, self.week)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
    K,
    DEF,
}

impl Position {
    pub const ALL: [Position; 6] =
        [Position::QB, Position::RB, Position::WR, Position::TE, Position::K, Position::DEF];

    /// Positions that have a replacement-level baseline
    pub const REPLACEMENT: [Position; 4] = [Position::QB, Position::RB, Position::WR, Position::TE];

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::QB => "QB",
            Position::RB => "RB",
            Position::WR => "WR",
            Position::TE => "TE",
            Position::K => "K",
            Position::DEF => "DEF",
        }
    }

    /// 1-based weekly rank that defines replacement level
    pub fn rank_cutoff(&self) -> Option<usize> {
        match self {
            Position::QB | Position::TE => Some(13),
            Position::RB | Position::WR => Some(31),
            Position::K | Position::DEF => None,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QB" => Ok(Position::QB),
            "RB" => Ok(Position::RB),
            "WR" => Ok(Position::WR),
            "TE" => Ok(Position::TE),
            "K" => Ok(Position::K),
            "DEF" => Ok(Position::DEF),
            other => Err(format!("unknown position: {other}")),
        }
    }
}

/// Round half-to-even at `places` decimals through an exact decimal
/// representation of the float.
pub fn round_decimal(value: f64, places: i64) -> f64 {
    BigDecimal::from_f64(value)
        .and_then(|d| d.round(places).to_f64())
        .unwrap_or(value)
}

/// One starter's line for a (season, week, manager)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerWeekRecord {
    pub points: f64,
    pub position: Position,
    pub player_id: String,
    /// Final standing (1, 2 or 3) of the roster, playoff weeks only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<u8>,
}

/// A manager's starters for one week, keyed by player name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManagerWeek {
    #[serde(rename = "Total_Points")]
    pub total_points: f64,
    #[serde(flatten)]
    pub players: BTreeMap<PlayerName, PlayerWeekRecord>,
}

impl ManagerWeek {
    /// Build a week and derive its total from the recorded players
    pub fn from_players(players: BTreeMap<PlayerName, PlayerWeekRecord>) -> Self {
        let sum = players
            .values()
            .filter_map(|record| BigDecimal::from_f64(record.points))
            .fold(BigDecimal::from(0), |acc, points| acc + points);
        let total_points = sum.round(2).to_f64().unwrap_or(0.0);

        Self { total_points, players }
    }

    pub fn players_at(&self, position: Position) -> impl Iterator<Item = (&PlayerName, &PlayerWeekRecord)> {
        self.players.iter().filter(move |(_, record)| record.position == position)
    }
}

/// manager → starters
pub type StartersWeek = BTreeMap<ManagerName, ManagerWeek>;
pub type StartersCache = SeasonWeekMap<StartersWeek>;

/// Bye-aware 3-year averages, one per replacement position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RollingAverages {
    #[serde(rename = "QB_3yr_avg", default, skip_serializing_if = "Option::is_none")]
    pub qb: Option<f64>,
    #[serde(rename = "RB_3yr_avg", default, skip_serializing_if = "Option::is_none")]
    pub rb: Option<f64>,
    #[serde(rename = "WR_3yr_avg", default, skip_serializing_if = "Option::is_none")]
    pub wr: Option<f64>,
    #[serde(rename = "TE_3yr_avg", default, skip_serializing_if = "Option::is_none")]
    pub te: Option<f64>,
}

impl RollingAverages {
    pub fn get(&self, position: Position) -> Option<f64> {
        match position {
            Position::QB => self.qb,
            Position::RB => self.rb,
            Position::WR => self.wr,
            Position::TE => self.te,
            Position::K | Position::DEF => None,
        }
    }

    pub fn set(&mut self, position: Position, value: f64) {
        match position {
            Position::QB => self.qb = Some(value),
            Position::RB => self.rb = Some(value),
            Position::WR => self.wr = Some(value),
            Position::TE => self.te = Some(value),
            Position::K | Position::DEF => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        Position::REPLACEMENT.iter().all(|p| self.get(*p).is_none())
    }
}

/// Replacement-level scores for one week
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplacementWeek {
    #[serde(rename = "QB")]
    pub qb: f64,
    #[serde(rename = "RB")]
    pub rb: f64,
    #[serde(rename = "WR")]
    pub wr: f64,
    #[serde(rename = "TE")]
    pub te: f64,
    /// Teams without a game this week
    pub byes: u32,
    #[serde(flatten)]
    pub rolling: RollingAverages,
}

impl ReplacementWeek {
    /// Raw weekly threshold
    pub fn threshold(&self, position: Position) -> Option<f64> {
        match position {
            Position::QB => Some(self.qb),
            Position::RB => Some(self.rb),
            Position::WR => Some(self.wr),
            Position::TE => Some(self.te),
            Position::K | Position::DEF => None,
        }
    }

    pub fn set_threshold(&mut self, position: Position, value: f64) {
        match position {
            Position::QB => self.qb = value,
            Position::RB => self.rb = value,
            Position::WR => self.wr = value,
            Position::TE => self.te = value,
            Position::K | Position::DEF => {}
        }
    }

    /// Smoothed baseline used by the ffWAR simulation
    pub fn rolling_average(&self, position: Position) -> Option<f64> {
        self.rolling.get(position)
    }
}

pub type ReplacementCache = SeasonWeekMap<ReplacementWeek>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FfwarRecord {
    #[serde(rename = "ffWAR")]
    pub ffwar: f64,
    pub manager: ManagerName,
    pub position: Position,
}

/// player → score for one week
pub type FfwarWeek = BTreeMap<PlayerName, FfwarRecord>;
pub type FfwarCache = SeasonWeekMap<FfwarWeek>;
