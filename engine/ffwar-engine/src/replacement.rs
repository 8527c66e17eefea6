//! Replacement-level scores
//!
//! Each week's threshold is the score of the Nth best player at a position
//! (see [`Position::rank_cutoff`]). Raw weekly thresholds are noisy, so once
//! three earlier seasons are cached each week also gets a bye-aware 3-year
//! rolling average, which is what the ffWAR simulation uses as its baseline.

use crate::config::{LeagueConfig, ScheduleConfig};
use crate::error::{EngineError, Result};
use crate::models::{
    week_entry, Position, ReplacementCache, ReplacementWeek, RollingAverages, Season, SeasonWeek,
    Week,
};
use crate::orchestrator::{WeekPolicy, WeeklyBuilder};
use crate::players::PlayerDirectory;
use sleeper_client::{StatsSource, WeeklyStats};
use std::collections::BTreeMap;
use tracing::debug;

pub const REPLACEMENT_CACHE: &str = "replacement_score_cache";

pub const NFL_TEAMS: u32 = 32;
const TEAM_PREFIX: &str = "TEAM_";

/// Teams that did not play, from the `TEAM_*` lines in the weekly stats
pub fn bye_count(stats: &WeeklyStats) -> u32 {
    let playing = stats.keys().filter(|id| id.starts_with(TEAM_PREFIX)).count() as u32;
    NFL_TEAMS.saturating_sub(playing)
}

/// Raw replacement thresholds and bye count for one week
pub fn weekly_thresholds(stats: &WeeklyStats, players: &PlayerDirectory, at: SeasonWeek) -> Result<ReplacementWeek> {
    let mut scores: BTreeMap<Position, Vec<f64>> = BTreeMap::new();

    for (player_id, line) in stats {
        if player_id.starts_with(TEAM_PREFIX) {
            continue;
        }
        let Some(points) = line.pts_half_ppr else { continue };
        if line.gp == Some(0.0) {
            continue;
        }
        let Some(position) = players.position_of(player_id) else { continue };
        if position.rank_cutoff().is_some() {
            scores.entry(position).or_default().push(points);
        }
    }

    let mut week = ReplacementWeek { byes: bye_count(stats), ..Default::default() };
    for position in Position::REPLACEMENT {
        let Some(cutoff) = position.rank_cutoff() else { continue };
        let mut ranked = scores.remove(&position).unwrap_or_default();

        let required = cutoff + 1;
        if ranked.len() < required {
            return Err(EngineError::InsufficientPlayers {
                season: at.season,
                week: at.week,
                position,
                required,
                found: ranked.len(),
            });
        }

        ranked.sort_by(|a, b| b.total_cmp(a));
        week.set_threshold(position, ranked[cutoff - 1]);
    }

    Ok(week)
}

/// Lower every bucket to at most the value of each bucket above it, so the
/// baseline never falls as the bye count rises.
pub fn enforce_non_decreasing(buckets: &mut BTreeMap<u32, f64>) {
    let mut ceiling = f64::INFINITY;
    for value in buckets.values_mut().rev() {
        if *value > ceiling {
            *value = ceiling;
        }
        ceiling = *value;
    }
}

/// Weeks of `season` that feed the rolling average for `at`
fn window_weeks(season: Season, at: SeasonWeek, policy: &WeekPolicy) -> std::ops::RangeInclusive<Week> {
    let length = policy.season_length(season);
    if season == at.season {
        1..=at.week
    } else if season == at.season - 3 {
        at.week..=length
    } else {
        1..=length
    }
}

/// Bye-aware 3-year averages for `at`, looked up at `fresh`'s bye count.
///
/// `fresh` is the week being built and is not yet part of `history`.
pub fn rolling_averages(
    at: SeasonWeek,
    fresh: &ReplacementWeek,
    history: &ReplacementCache,
    policy: &WeekPolicy,
) -> RollingAverages {
    let mut sums: BTreeMap<Position, BTreeMap<u32, (f64, u32)>> = BTreeMap::new();

    for season in [at.season, at.season - 1, at.season - 2, at.season - 3] {
        for week in window_weeks(season, at, policy) {
            let entry = if season == at.season && week == at.week {
                Some(fresh)
            } else {
                week_entry(history, season, week)
            };
            let Some(entry) = entry else { continue };

            for position in Position::REPLACEMENT {
                if let Some(score) = entry.threshold(position) {
                    let bucket = sums.entry(position).or_default().entry(entry.byes).or_insert((0.0, 0));
                    bucket.0 += score;
                    bucket.1 += 1;
                }
            }
        }
    }

    let mut averages = RollingAverages::default();
    for (position, buckets) in sums {
        let mut by_byes: BTreeMap<u32, f64> =
            buckets.into_iter().map(|(byes, (sum, n))| (byes, sum / n as f64)).collect();
        enforce_non_decreasing(&mut by_byes);

        if let Some(avg) = by_byes.get(&fresh.byes) {
            averages.set(position, *avg);
        }
    }

    averages
}

pub struct ReplacementBuilder<'a> {
    source: &'a dyn StatsSource,
    league: &'a LeagueConfig,
    schedule: &'a ScheduleConfig,
    players: &'a PlayerDirectory,
}

impl<'a> ReplacementBuilder<'a> {
    pub fn new(
        source: &'a dyn StatsSource,
        league: &'a LeagueConfig,
        schedule: &'a ScheduleConfig,
        players: &'a PlayerDirectory,
    ) -> Self {
        Self { source, league, schedule, players }
    }
}

#[async_trait::async_trait]
impl WeeklyBuilder for ReplacementBuilder<'_> {
    type Output = ReplacementWeek;

    fn cache_name(&self) -> &'static str {
        REPLACEMENT_CACHE
    }

    /// League seasons plus the backfill seasons before the first one
    fn seasons(&self) -> Vec<Season> {
        let mut seasons = self.league.season_years();
        if let Some(first) = seasons.first().copied() {
            let backfill = self.schedule.replacement_backfill_seasons as Season;
            seasons.extend((first - backfill)..first);
            seasons.sort_unstable();
        }
        seasons
    }

    fn policy(&self) -> WeekPolicy {
        self.schedule.replacement
    }

    async fn build_week(&self, at: SeasonWeek, history: &ReplacementCache) -> Result<ReplacementWeek> {
        let stats = self.source.weekly_stats(at.season, at.week).await?;
        let mut week = weekly_thresholds(&stats, self.players, at)?;

        if history.contains_key(&(at.season - 3)) {
            week.rolling = rolling_averages(at, &week, history, &self.schedule.replacement);
        } else {
            debug!(season = at.season, week = at.week, "no data three seasons back, skipping rolling average");
        }

        Ok(week)
    }
}
