//! Incremental update loop shared by every cache builder
//!
//! A cache is extended one (season, week) at a time. After each successful
//! week the whole cache is rewritten together with its progress marker, so a
//! crash loses at most the week in flight. A week whose build fails is not
//! stored and stops the marker from moving past it; the next run starts over
//! from the first missing week.

use crate::error::Result;
use crate::models::{Season, SeasonWeek, SeasonWeekMap, Week};
use persistence::{load_existing_cache, save_cache, PersistedCache, PersistenceBackend, ProgressMarker};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Highest week a builder processes in a season
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekPolicy {
    /// Upper bound applied to the live week of the current season
    pub current_cap: Option<Week>,
    /// Last season of the legacy schedule
    pub legacy_last_season: Season,
    /// Max week for finished seasons up to `legacy_last_season`
    pub legacy_max: Week,
    /// Max week for later finished seasons
    pub modern_max: Week,
}

impl WeekPolicy {
    pub fn new(current_cap: Option<Week>, legacy_last_season: Season, legacy_max: Week, modern_max: Week) -> Self {
        Self { current_cap, legacy_last_season, legacy_max, modern_max }
    }

    /// Max week for a finished season
    pub fn season_length(&self, season: Season) -> Week {
        if season <= self.legacy_last_season {
            self.legacy_max
        } else {
            self.modern_max
        }
    }

    pub fn max_week(&self, season: Season, current: SeasonWeek) -> Week {
        if season == current.season {
            match self.current_cap {
                Some(cap) => current.week.min(cap),
                None => current.week,
            }
        } else {
            self.season_length(season)
        }
    }

    /// The furthest point this builder can reach right now
    pub fn target(&self, current: SeasonWeek) -> SeasonWeek {
        SeasonWeek::new(current.season, self.max_week(current.season, current))
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.legacy_max == 0 || self.modern_max == 0 || self.current_cap == Some(0) {
            return Err("week limits must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Weeks still to build, in processing order
pub fn pending_weeks(
    seasons: &[Season],
    marker: ProgressMarker,
    current: SeasonWeek,
    policy: &WeekPolicy,
) -> Vec<SeasonWeek> {
    let target = policy.target(current);
    if marker.season == target.season && marker.week >= target.week {
        return Vec::new();
    }

    let mut seasons = seasons.to_vec();
    seasons.sort_unstable();
    seasons.dedup();

    let mut pending = Vec::new();
    for season in seasons {
        if season > current.season {
            break;
        }
        if !marker.is_initial() && season < marker.season {
            continue;
        }

        let first = if season == marker.season { marker.week + 1 } else { 1 };
        let last = policy.max_week(season, current);
        pending.extend((first..=last).map(|week| SeasonWeek::new(season, week)));
    }

    pending
}

/// One kind of weekly cache
#[async_trait::async_trait]
pub trait WeeklyBuilder: Send + Sync {
    type Output: Serialize + DeserializeOwned + Send + Sync;

    /// Name of the persisted structure
    fn cache_name(&self) -> &'static str;

    /// Seasons this builder covers
    fn seasons(&self) -> Vec<Season>;

    fn policy(&self) -> WeekPolicy;

    /// Build one week. `history` holds every week built so far.
    async fn build_week(
        &self,
        week: SeasonWeek,
        history: &SeasonWeekMap<Self::Output>,
    ) -> Result<Self::Output>;
}

/// Outcome of one incremental run
#[derive(Debug)]
pub struct UpdateReport<T> {
    /// Finished cache, without its progress marker
    pub data: SeasonWeekMap<T>,
    pub progress: ProgressMarker,
    pub built: Vec<SeasonWeek>,
    pub failed: Vec<(SeasonWeek, String)>,
}

/// Bring one cache up to `current`
pub async fn run_incremental<B: WeeklyBuilder>(
    builder: &B,
    backend: &dyn PersistenceBackend,
    current: SeasonWeek,
) -> Result<UpdateReport<B::Output>> {
    let name = builder.cache_name();
    let existing = load_existing_cache::<SeasonWeekMap<B::Output>>(backend, name).await?;
    let first_run = existing.is_none();
    let mut cache = existing.unwrap_or_else(|| PersistedCache::new(ProgressMarker::default(), SeasonWeekMap::new()));

    let pending = pending_weeks(&builder.seasons(), cache.progress, current, &builder.policy());
    if pending.is_empty() {
        debug!(cache = name, progress = %cache.progress, "cache is current");
        if first_run {
            save_cache(backend, name, &cache).await?;
        }
        return Ok(UpdateReport { progress: cache.progress, data: cache.into_data(), built: Vec::new(), failed: Vec::new() });
    }

    info!(cache = name, from = %pending[0], to = %pending[pending.len() - 1], weeks = pending.len(), "updating cache");

    let mut built = Vec::new();
    let mut failed = Vec::new();
    for week in pending {
        match builder.build_week(week, &cache.data).await {
            Ok(output) => {
                cache.data.entry(week.season).or_default().insert(week.week, output);
                if failed.is_empty() {
                    cache.advance(week.season, week.week);
                }
                save_cache(backend, name, &cache).await?;
                built.push(week);
                info!(cache = name, season = week.season, week = week.week, "week cached");
            }
            Err(e) => {
                warn!(cache = name, season = week.season, week = week.week, error = %e, "week not cached, will retry next run");
                failed.push((week, e.to_string()));
            }
        }
    }

    Ok(UpdateReport { progress: cache.progress, data: cache.into_data(), built, failed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use persistence::{load_cache, InMemoryPersistence};
    use std::collections::HashSet;
    use std::sync::Mutex;

    fn starters_policy() -> WeekPolicy {
        WeekPolicy::new(None, 2020, 13, 14)
    }

    fn weeks(pending: &[SeasonWeek]) -> Vec<(Season, Week)> {
        pending.iter().map(|w| (w.season, w.week)).collect()
    }

    #[test]
    fn test_max_week_by_era() {
        let replacement = WeekPolicy::new(Some(18), 2020, 17, 18);
        let current = SeasonWeek::new(2024, 20);
        assert_eq!(replacement.max_week(2016, current), 17);
        assert_eq!(replacement.max_week(2020, current), 17);
        assert_eq!(replacement.max_week(2021, current), 18);
        assert_eq!(replacement.max_week(2024, current), 18);

        let ffwar = WeekPolicy::new(Some(14), 2020, 13, 14);
        assert_eq!(ffwar.max_week(2019, current), 13);
        assert_eq!(ffwar.max_week(2024, SeasonWeek::new(2024, 16)), 14);
        assert_eq!(ffwar.max_week(2024, SeasonWeek::new(2024, 6)), 6);

        assert_eq!(starters_policy().max_week(2024, SeasonWeek::new(2024, 16)), 16);
    }

    #[test]
    fn test_resume_mid_season() {
        let pending = pending_weeks(
            &[2023, 2024],
            ProgressMarker::new(2024, 3),
            SeasonWeek::new(2024, 5),
            &starters_policy(),
        );
        assert_eq!(weeks(&pending), vec![(2024, 4), (2024, 5)]);
    }

    #[test]
    fn test_fresh_cache_walks_every_season() {
        let pending = pending_weeks(
            &[2020, 2019, 2021],
            ProgressMarker::default(),
            SeasonWeek::new(2021, 2),
            &starters_policy(),
        );
        assert_eq!(pending.len(), 13 + 13 + 2);
        assert_eq!(weeks(&pending[..1]), vec![(2019, 1)]);
        assert_eq!(weeks(&pending[pending.len() - 1..]), vec![(2021, 2)]);
    }

    #[test]
    fn test_marker_at_target_means_nothing_pending() {
        let policy = WeekPolicy::new(Some(14), 2020, 13, 14);
        let pending = pending_weeks(&[2024], ProgressMarker::new(2024, 14), SeasonWeek::new(2024, 17), &policy);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_finished_season_moves_to_next() {
        let pending = pending_weeks(
            &[2023, 2024],
            ProgressMarker::new(2023, 14),
            SeasonWeek::new(2024, 1),
            &starters_policy(),
        );
        assert_eq!(weeks(&pending), vec![(2024, 1)]);
    }

    #[test]
    fn test_future_seasons_are_ignored() {
        let pending = pending_weeks(
            &[2024, 2025],
            ProgressMarker::new(2024, 13),
            SeasonWeek::new(2024, 14),
            &starters_policy(),
        );
        assert_eq!(weeks(&pending), vec![(2024, 14)]);
    }

    #[test]
    fn test_preseason_current_has_no_weeks() {
        let pending = pending_weeks(
            &[2024, 2025],
            ProgressMarker::new(2024, 14),
            SeasonWeek::new(2025, 0),
            &starters_policy(),
        );
        assert!(pending.is_empty());
    }

    /// Doubles the week number; fails for the configured weeks
    struct CountingBuilder {
        failing: HashSet<SeasonWeek>,
        calls: Mutex<Vec<SeasonWeek>>,
    }

    impl CountingBuilder {
        fn new(failing: &[SeasonWeek]) -> Self {
            Self { failing: failing.iter().copied().collect(), calls: Mutex::new(Vec::new()) }
        }

        fn calls(&self) -> Vec<SeasonWeek> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl WeeklyBuilder for CountingBuilder {
        type Output = u32;

        fn cache_name(&self) -> &'static str {
            "counting_cache"
        }

        fn seasons(&self) -> Vec<Season> {
            vec![2023, 2024]
        }

        fn policy(&self) -> WeekPolicy {
            starters_policy()
        }

        async fn build_week(&self, week: SeasonWeek, _history: &SeasonWeekMap<u32>) -> Result<u32> {
            self.calls.lock().unwrap().push(week);
            if self.failing.contains(&week) {
                return Err(EngineError::NoPlayoffRosters { season: week.season, week: week.week });
            }
            Ok(week.week * 2)
        }
    }

    #[tokio::test]
    async fn test_run_persists_every_week() {
        let backend = InMemoryPersistence::with_default_config();
        let builder = CountingBuilder::new(&[]);

        let report = run_incremental(&builder, &backend, SeasonWeek::new(2024, 3)).await.unwrap();

        assert_eq!(report.built.len(), 14 + 3);
        assert_eq!(report.progress, ProgressMarker::new(2024, 3));
        assert_eq!(report.data[&2024][&3], 6);
        assert_eq!(backend.write_count("counting_cache").await, 17);
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let backend = InMemoryPersistence::with_default_config();
        let first = run_incremental(&CountingBuilder::new(&[]), &backend, SeasonWeek::new(2024, 3)).await.unwrap();
        let writes = backend.write_count("counting_cache").await;

        let builder = CountingBuilder::new(&[]);
        let second = run_incremental(&builder, &backend, SeasonWeek::new(2024, 3)).await.unwrap();

        assert!(builder.calls().is_empty());
        assert_eq!(second.data, first.data);
        assert_eq!(second.progress, first.progress);
        assert_eq!(backend.write_count("counting_cache").await, writes);
    }

    #[tokio::test]
    async fn test_resume_only_builds_new_weeks() {
        let backend = InMemoryPersistence::with_default_config();
        run_incremental(&CountingBuilder::new(&[]), &backend, SeasonWeek::new(2024, 3)).await.unwrap();

        let builder = CountingBuilder::new(&[]);
        let report = run_incremental(&builder, &backend, SeasonWeek::new(2024, 5)).await.unwrap();

        assert_eq!(builder.calls(), vec![SeasonWeek::new(2024, 4), SeasonWeek::new(2024, 5)]);
        assert_eq!(report.progress, ProgressMarker::new(2024, 5));
        assert_eq!(report.data[&2024].len(), 5);
    }

    #[tokio::test]
    async fn test_failed_week_holds_marker_and_is_retried() {
        let backend = InMemoryPersistence::with_default_config();
        let builder = CountingBuilder::new(&[SeasonWeek::new(2024, 2)]);

        let report = run_incremental(&builder, &backend, SeasonWeek::new(2024, 4)).await.unwrap();

        assert_eq!(report.progress, ProgressMarker::new(2024, 1));
        assert_eq!(report.failed.len(), 1);
        assert!(!report.data[&2024].contains_key(&2));
        // Later weeks are still computed and stored
        assert_eq!(report.data[&2024][&4], 8);

        let stored: PersistedCache<SeasonWeekMap<u32>> = load_cache(&backend, "counting_cache").await.unwrap();
        assert_eq!(stored.progress, ProgressMarker::new(2024, 1));

        let retry = CountingBuilder::new(&[]);
        let report = run_incremental(&retry, &backend, SeasonWeek::new(2024, 4)).await.unwrap();
        assert_eq!(retry.calls(), vec![SeasonWeek::new(2024, 2), SeasonWeek::new(2024, 3), SeasonWeek::new(2024, 4)]);
        assert_eq!(report.progress, ProgressMarker::new(2024, 4));
        assert_eq!(report.data[&2024][&2], 4);
    }

    #[tokio::test]
    async fn test_first_run_with_nothing_pending_initializes_cache() {
        let backend = InMemoryPersistence::with_default_config();
        let builder = CountingBuilder::new(&[]);

        let report = run_incremental(&builder, &backend, SeasonWeek::new(2022, 0)).await.unwrap();

        assert!(report.data.is_empty());
        let stored: PersistedCache<SeasonWeekMap<u32>> = load_cache(&backend, "counting_cache").await.unwrap();
        assert!(stored.progress.is_initial());
    }
}
