//! Engine configuration
//!
//! Every section has working defaults for the Patriot Center league. A TOML
//! file and `FFWAR_*` environment variables can override any field, e.g.
//! `FFWAR_STORAGE__DATA_DIR=/var/lib/ffwar`.

use crate::error::{EngineError, Result};
use crate::identity::IdentityOverride;
use crate::models::{Season, Week};
use crate::orchestrator::WeekPolicy;
use persistence::PersistenceConfig;
use serde::{Deserialize, Serialize};
use sleeper_client::SleeperConfig;
use std::path::Path;

/// Complete engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub league: LeagueConfig,
    pub schedule: ScheduleConfig,
    pub sleeper: SleeperConfig,
    pub storage: PersistenceConfig,
    pub logging: LoggingConfig,
}

/// One fantasy season and the platform league that hosted it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueSeason {
    pub season: Season,
    pub league_id: String,
}

/// Platform display name and the manager's real name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerAlias {
    pub username: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeagueConfig {
    pub seasons: Vec<LeagueSeason>,
    pub managers: Vec<ManagerAlias>,
    pub overrides: Vec<IdentityOverride>,
}

impl Default for LeagueConfig {
    fn default() -> Self {
        let seasons = [
            (2019, "399260536505671680"),
            (2020, "567745628522500096"),
            (2021, "650026670341861376"),
            (2022, "784823696450772992"),
            (2023, "979405891168493568"),
            (2024, "1113631749025796096"),
            (2025, "1256401636973101056"),
        ]
        .into_iter()
        .map(|(season, league_id)| LeagueSeason { season, league_id: league_id.to_string() })
        .collect();

        let managers = [
            ("aalvaa", "Anthony"),
            ("bbennick", "Benz"),
            ("BilliamBlowland", "Billiam"),
            ("senorpapi", "Christian"),
            ("codestoppable", "Cody"),
            ("dpereira7", "Davey"),
            ("BrownBoyLove", "Dheeraj"),
            ("jkjackson16", "Jack"),
            ("Jrazzam", "Jay"),
            ("lukehellyer", "Luke"),
            ("mitchwest", "Mitch"),
            ("owen0010", "Owen"),
            ("parkdaddy", "Parker"),
            ("Siemonster", "Sach"),
            ("samprice18", "Sam"),
            ("charris34", "Soup"),
            ("tommylowry", "Tommy"),
            ("bispity", "Ty"),
        ]
        .into_iter()
        .map(|(username, name)| ManagerAlias { username: username.to_string(), name: name.to_string() })
        .collect();

        Self { seasons, managers, overrides: IdentityOverride::league_history() }
    }
}

impl LeagueConfig {
    /// Platform league id for a season
    pub fn league_id(&self, season: Season) -> Result<&str> {
        self.seasons
            .iter()
            .find(|s| s.season == season)
            .map(|s| s.league_id.as_str())
            .ok_or(EngineError::UnknownSeason { season })
    }

    /// Real name for a platform display name
    pub fn manager_for(&self, display_name: &str) -> Option<&str> {
        self.managers.iter().find(|m| m.username == display_name).map(|m| m.name.as_str())
    }

    /// Configured seasons, ascending
    pub fn season_years(&self) -> Vec<Season> {
        let mut years: Vec<Season> = self.seasons.iter().map(|s| s.season).collect();
        years.sort_unstable();
        years.dedup();
        years
    }
}

/// Week limits per builder and era
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Last season played under the shorter legacy schedule
    pub legacy_last_season: Season,
    /// Fantasy regular-season length through `legacy_last_season`
    pub legacy_regular_season_weeks: Week,
    /// Fantasy regular-season length afterwards
    pub regular_season_weeks: Week,
    /// Seasons before the first league season pulled in for rolling averages
    pub replacement_backfill_seasons: u32,
    pub starters: WeekPolicy,
    pub replacement: WeekPolicy,
    pub ffwar: WeekPolicy,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            legacy_last_season: 2020,
            legacy_regular_season_weeks: 13,
            regular_season_weeks: 14,
            replacement_backfill_seasons: 3,
            starters: WeekPolicy::new(None, 2020, 13, 14),
            // NFL regular season: 17 weeks through 2020, 18 since
            replacement: WeekPolicy::new(Some(18), 2020, 17, 18),
            ffwar: WeekPolicy::new(Some(14), 2020, 13, 14),
        }
    }
}

impl ScheduleConfig {
    /// Length of the fantasy regular season; later weeks are playoffs
    pub fn regular_season_weeks(&self, season: Season) -> Week {
        if season <= self.legacy_last_season {
            self.legacy_regular_season_weeks
        } else {
            self.regular_season_weeks
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "compact", "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "compact".to_string() }
    }
}

impl EngineConfig {
    /// Load an optional TOML file, then `FFWAR_*` environment variables, over
    /// the defaults, and validate the result.
    ///
    /// A section or list given in a source replaces the default wholesale.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(
                config::Environment::with_prefix("FFWAR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_error)?
            .try_deserialize()
            .map_err(config_error)?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.league.seasons.is_empty() {
            return Err(EngineError::invalid_config("league.seasons must not be empty"));
        }

        if let Some(dup) = self
            .league
            .seasons
            .iter()
            .enumerate()
            .find(|(i, s)| self.league.seasons[..*i].iter().any(|other| other.season == s.season))
        {
            return Err(EngineError::invalid_config(format!(
                "season {} is configured more than once",
                dup.1.season
            )));
        }

        for (name, policy) in [
            ("starters", &self.schedule.starters),
            ("replacement", &self.schedule.replacement),
            ("ffwar", &self.schedule.ffwar),
        ] {
            policy
                .validate()
                .map_err(|e| EngineError::invalid_config(format!("schedule.{name}: {e}")))?;
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(EngineError::invalid_config(format!("unknown log level: {other}")))
            }
        }

        match self.logging.format.as_str() {
            "compact" | "pretty" | "json" => {}
            other => {
                return Err(EngineError::invalid_config(format!("unknown log format: {other}")))
            }
        }

        self.sleeper.validate().map_err(EngineError::invalid_config)?;
        self.storage.validate().map_err(EngineError::invalid_config)?;

        Ok(())
    }
}

fn config_error(e: config::ConfigError) -> EngineError {
    EngineError::invalid_config(e.to_string())
}
