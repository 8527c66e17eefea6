//! ffWAR: wins a starter added over a replacement-level player
//!
//! For one position in one week every manager's lineup is replayed against
//! every other manager twice, once with the player's score and once with the
//! replacement baseline. The score is the net number of results the player
//! flipped, per simulated game.

use crate::config::{LeagueConfig, ScheduleConfig};
use crate::error::{EngineError, Result};
use crate::models::{
    round_decimal, week_entry, FfwarRecord, FfwarWeek, ManagerName, PlayerName, Position,
    ReplacementCache, Season, SeasonWeek, SeasonWeekMap, StartersCache, StartersWeek,
};
use crate::orchestrator::{WeekPolicy, WeeklyBuilder};
use crate::replacement::REPLACEMENT_CACHE;
use crate::starters::STARTERS_CACHE;
use std::collections::BTreeMap;
use tracing::debug;

pub const FFWAR_CACHE: &str = "ffWAR_cache";

/// Managers left in the winners bracket during playoff weeks
pub const PLAYOFF_FIELD_SIZE: usize = 4;

/// Applied to playoff-field scores so they line up with full-league weeks.
/// Only established for a field of exactly [`PLAYOFF_FIELD_SIZE`] managers.
const PLAYOFF_DIVISOR: f64 = 3.0;

const SCORE_DECIMALS: i64 = 3;

/// Who takes part in a simulated week
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationField {
    /// The whole league
    Regular,
    /// The four-team playoff field
    Playoff,
}

impl SimulationField {
    pub fn for_week(manager_count: usize, playoff_week: bool) -> Self {
        if playoff_week && manager_count == PLAYOFF_FIELD_SIZE {
            SimulationField::Playoff
        } else {
            SimulationField::Regular
        }
    }
}

/// A manager's week seen from one position
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManagerSlice {
    pub total_points: f64,
    /// Starters at the position and their points
    pub players: BTreeMap<PlayerName, f64>,
}

impl ManagerSlice {
    fn positional_average(&self) -> f64 {
        if self.players.is_empty() {
            0.0
        } else {
            self.players.values().sum::<f64>() / self.players.len() as f64
        }
    }
}

pub type PositionSlice = BTreeMap<ManagerName, ManagerSlice>;

/// Regroup a week of starters for one position. Every manager is present,
/// including those who started nobody there.
pub fn slice_by_position(week: &StartersWeek, position: Position) -> PositionSlice {
    week.iter()
        .map(|(manager, lineup)| {
            let players = lineup
                .players_at(position)
                .map(|(name, record)| (name.clone(), record.points))
                .collect();
            (manager.clone(), ManagerSlice { total_points: lineup.total_points, players })
        })
        .collect()
}

struct Baselines {
    total_minus_position: f64,
    weighted_total_score: f64,
}

/// ffWAR for every starter at `position`, empty when nobody started there
pub fn simulate_position(
    slice: &PositionSlice,
    position: Position,
    replacement: f64,
    field: SimulationField,
) -> FfwarWeek {
    let all_points: Vec<f64> = slice.values().flat_map(|m| m.players.values().copied()).collect();
    if all_points.is_empty() {
        return FfwarWeek::new();
    }
    let league_average = all_points.iter().sum::<f64>() / all_points.len() as f64;

    let baselines: Vec<Baselines> = slice
        .values()
        .map(|m| {
            let own_average = m.positional_average();
            Baselines {
                total_minus_position: m.total_points - own_average,
                weighted_total_score: m.total_points - own_average + league_average,
            }
        })
        .collect();

    let managers = baselines.len();
    let games = managers * managers.saturating_sub(1);

    let mut results = FfwarWeek::new();
    for (manager, lineup) in slice {
        for (player, points) in &lineup.players {
            let mut net: i64 = 0;
            for (i, playing) in baselines.iter().enumerate() {
                for (j, opposing) in baselines.iter().enumerate() {
                    if i == j {
                        continue;
                    }
                    let opponent = opposing.weighted_total_score;
                    let with_player = playing.total_minus_position + points;
                    let with_replacement = playing.total_minus_position + replacement;

                    if with_player > opponent && with_replacement < opponent {
                        net += 1;
                    } else if with_player < opponent && with_replacement > opponent {
                        net -= 1;
                    }
                }
            }

            let ffwar = if games == 0 {
                0.0
            } else {
                let mut score = net as f64 / games as f64;
                if field == SimulationField::Playoff {
                    score /= PLAYOFF_DIVISOR;
                }
                round_decimal(score, SCORE_DECIMALS)
            };

            results.insert(player.clone(), FfwarRecord { ffwar, manager: manager.clone(), position });
        }
    }

    results
}

pub struct FfwarBuilder<'a> {
    league: &'a LeagueConfig,
    schedule: &'a ScheduleConfig,
    starters: &'a StartersCache,
    replacement: &'a ReplacementCache,
}

impl<'a> FfwarBuilder<'a> {
    pub fn new(
        league: &'a LeagueConfig,
        schedule: &'a ScheduleConfig,
        starters: &'a StartersCache,
        replacement: &'a ReplacementCache,
    ) -> Self {
        Self { league, schedule, starters, replacement }
    }

    pub fn compute_week(&self, at: SeasonWeek) -> Result<FfwarWeek> {
        let missing = |cache| EngineError::MissingUpstreamWeek { cache, season: at.season, week: at.week };

        let starters = week_entry(self.starters, at.season, at.week).ok_or_else(|| missing(STARTERS_CACHE))?;
        let replacement =
            week_entry(self.replacement, at.season, at.week).ok_or_else(|| missing(REPLACEMENT_CACHE))?;

        let playoff_week = at.week > self.schedule.regular_season_weeks(at.season);
        let field = SimulationField::for_week(starters.len(), playoff_week);

        let mut week = FfwarWeek::new();
        for position in Position::ALL {
            if position.rank_cutoff().is_none() {
                debug!(%position, "no replacement level for position, skipping");
                continue;
            }
            let baseline = replacement.rolling_average(position).ok_or_else(|| missing(REPLACEMENT_CACHE))?;

            let slice = slice_by_position(starters, position);
            week.extend(simulate_position(&slice, position, baseline, field));
        }

        Ok(week)
    }
}

#[async_trait::async_trait]
impl WeeklyBuilder for FfwarBuilder<'_> {
    type Output = FfwarWeek;

    fn cache_name(&self) -> &'static str {
        FFWAR_CACHE
    }

    fn seasons(&self) -> Vec<Season> {
        self.league.season_years()
    }

    fn policy(&self) -> WeekPolicy {
        self.schedule.ffwar
    }

    async fn build_week(&self, at: SeasonWeek, _history: &SeasonWeekMap<FfwarWeek>) -> Result<FfwarWeek> {
        self.compute_week(at)
    }
}
