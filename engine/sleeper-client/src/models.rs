//! Payload models for the Sleeper API
//!
//! Only the fields the cache builders read are modelled; everything else in
//! the platform responses is ignored during decoding.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// League metadata (`league/{id}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueInfo {
    #[serde(default)]
    pub league_id: String,
    /// Season label, e.g. "2024"
    pub season: String,
    #[serde(default)]
    pub settings: LeagueSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeagueSettings {
    /// Most recent week with final scoring (0 before the season starts)
    #[serde(default)]
    pub last_scored_leg: u32,
    #[serde(default)]
    pub playoff_week_start: Option<u32>,
}

impl LeagueInfo {
    /// Season label parsed as a year
    pub fn season_year(&self) -> Option<i32> {
        self.season.trim().parse().ok()
    }
}

/// League member (`league/{id}/users`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleeperUser {
    pub user_id: String,
    #[serde(default)]
    pub display_name: String,
}

/// League roster (`league/{id}/rosters`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleeperRoster {
    pub roster_id: u32,
    /// Orphaned rosters have no owner
    #[serde(default)]
    pub owner_id: Option<String>,
}

/// One roster's side of a weekly matchup (`league/{id}/matchups/{week}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleeperMatchup {
    pub roster_id: u32,
    #[serde(default)]
    pub matchup_id: Option<u32>,
    /// Starting player ids; empty slots are reported as "0"
    #[serde(default)]
    pub starters: Vec<String>,
    #[serde(default)]
    pub players_points: HashMap<String, f64>,
    #[serde(default)]
    pub points: Option<f64>,
}

impl SleeperMatchup {
    /// Points a player scored this week, zero when the platform has no entry
    pub fn points_for(&self, player_id: &str) -> f64 {
        self.players_points.get(player_id).copied().unwrap_or(0.0)
    }
}

/// Winners-bracket match (`league/{id}/winners_bracket`)
///
/// `p` tags placement games: 1 is the championship, 3 the third-place game
/// and 5 the fifth-place consolation game.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BracketMatch {
    pub r: u32,
    #[serde(default)]
    pub m: Option<u32>,
    #[serde(default)]
    pub t1: Option<u32>,
    #[serde(default)]
    pub t2: Option<u32>,
    #[serde(default)]
    pub w: Option<u32>,
    #[serde(default)]
    pub l: Option<u32>,
    #[serde(default)]
    pub p: Option<u32>,
}

impl BracketMatch {
    /// Every roster id this match references
    pub fn roster_ids(&self) -> impl Iterator<Item = u32> {
        [self.t1, self.t2, self.w, self.l].into_iter().flatten()
    }
}

/// A single player's line in the league-wide weekly stats
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerStatLine {
    #[serde(default)]
    pub pts_half_ppr: Option<f64>,
    /// Games played; absent for many lines
    #[serde(default)]
    pub gp: Option<f64>,
}

/// League-wide weekly stats keyed by player id, plus one `TEAM_<code>` entry
/// per team that played
pub type WeeklyStats = HashMap<String, PlayerStatLine>;

/// Player directory entry (`players/nfl`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerMeta {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub years_exp: Option<u32>,
    #[serde(default)]
    pub fantasy_positions: Option<Vec<String>>,
    #[serde(default)]
    pub depth_chart_position: Option<String>,
}
