//! Builds the three caches in dependency order
//!
//! Nothing is loaded implicitly: callers construct a [`CachePipeline`] and
//! call [`CachePipeline::load_or_build`] once, then hand the returned
//! [`LeagueCaches`] to whatever needs them.

use crate::config::{EngineConfig, LeagueConfig};
use crate::error::{EngineError, Result};
use crate::ffwar::{FfwarBuilder, FFWAR_CACHE};
use crate::models::{
    week_count, FfwarCache, ReplacementCache, Season, SeasonWeek, SeasonWeekMap, StartersCache,
    Week,
};
use crate::orchestrator::{run_incremental, UpdateReport};
use crate::players::PlayerDirectory;
use crate::replacement::{ReplacementBuilder, REPLACEMENT_CACHE};
use crate::starters::{StartersBuilder, STARTERS_CACHE};
use chrono::{Datelike, NaiveDate};
use persistence::{load_existing_cache, PersistenceBackend, ProgressMarker};
use sleeper_client::StatsSource;
use tracing::{info, warn};

pub const CACHE_NAMES: [&str; 3] = [STARTERS_CACHE, REPLACEMENT_CACHE, FFWAR_CACHE];

/// Current season and last scored week, from the league hosting `year`
pub async fn resolve_current(source: &dyn StatsSource, league: &LeagueConfig, year: Season) -> Result<SeasonWeek> {
    let league_id = league.league_id(year)?;
    let info = source.league(league_id).await?;
    let season = info
        .season_year()
        .ok_or_else(|| EngineError::InvalidSeasonLabel { label: info.season.clone() })?;

    Ok(SeasonWeek::new(season, info.settings.last_scored_leg))
}

#[derive(Debug, Clone)]
pub struct WeekFailure {
    pub cache: &'static str,
    pub week: SeasonWeek,
    pub error: String,
}

/// Finished caches, progress markers removed
#[derive(Debug, Clone, Default)]
pub struct LeagueCaches {
    pub starters: StartersCache,
    pub replacement: ReplacementCache,
    pub ffwar: FfwarCache,
    /// Weeks that could not be built this run
    pub failures: Vec<WeekFailure>,
}

#[derive(Debug, Clone)]
pub struct CacheStatus {
    pub name: &'static str,
    /// `None` when the cache has never been written
    pub progress: Option<ProgressMarker>,
    pub weeks: usize,
}

pub struct CachePipeline<'a> {
    config: &'a EngineConfig,
    source: &'a dyn StatsSource,
    backend: &'a dyn PersistenceBackend,
}

impl<'a> CachePipeline<'a> {
    pub fn new(config: &'a EngineConfig, source: &'a dyn StatsSource, backend: &'a dyn PersistenceBackend) -> Self {
        Self { config, source, backend }
    }

    /// Resolve the live season and week through the league for `today`'s year
    pub async fn resolve_current(&self, today: NaiveDate) -> Result<SeasonWeek> {
        resolve_current(self.source, &self.config.league, today.year()).await
    }

    /// Bring every cache up to `current` and return them
    pub async fn load_or_build(&self, current: SeasonWeek, today: NaiveDate) -> Result<LeagueCaches> {
        info!(%current, "updating league caches");

        let players = PlayerDirectory::load_or_refresh(self.source, self.backend, today).await?;
        let league = &self.config.league;
        let schedule = &self.config.schedule;
        let mut failures = Vec::new();

        let starters = StartersBuilder::new(self.source, league, schedule, &players);
        let starters = collect(run_incremental(&starters, self.backend, current).await?, STARTERS_CACHE, &mut failures);

        let replacement = ReplacementBuilder::new(self.source, league, schedule, &players);
        let replacement =
            collect(run_incremental(&replacement, self.backend, current).await?, REPLACEMENT_CACHE, &mut failures);

        let ffwar = FfwarBuilder::new(league, schedule, &starters, &replacement);
        let ffwar = collect(run_incremental(&ffwar, self.backend, current).await?, FFWAR_CACHE, &mut failures);

        if failures.is_empty() {
            info!("league caches are current");
        } else {
            warn!(failed = failures.len(), "some weeks could not be built");
        }

        Ok(LeagueCaches { starters, replacement, ffwar, failures })
    }

    /// Persisted progress of every cache
    pub async fn status(&self) -> Result<Vec<CacheStatus>> {
        let mut statuses = Vec::with_capacity(CACHE_NAMES.len());
        for name in CACHE_NAMES {
            let cache = load_existing_cache::<SeasonWeekMap<serde_json::Value>>(self.backend, name).await?;
            statuses.push(CacheStatus {
                name,
                progress: cache.as_ref().map(|c| c.progress),
                weeks: cache.as_ref().map_or(0, |c| week_count(&c.data)),
            });
        }
        Ok(statuses)
    }

    /// One stored week of a cache, as JSON
    pub async fn stored_week(&self, name: &str, season: Season, week: Week) -> Result<Option<serde_json::Value>> {
        let cache = load_existing_cache::<SeasonWeekMap<serde_json::Value>>(self.backend, name).await?;
        Ok(cache.and_then(|mut c| c.data.get_mut(&season).and_then(|weeks| weeks.remove(&week))))
    }
}

fn collect<T>(report: UpdateReport<T>, cache: &'static str, failures: &mut Vec<WeekFailure>) -> SeasonWeekMap<T> {
    failures.extend(report.failed.into_iter().map(|(week, error)| WeekFailure { cache, week, error }));
    report.data
}
