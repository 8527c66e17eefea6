//! Manager identity resolution
//!
//! Platform accounts map to the manager's real name through the configured
//! alias table. A short list of overrides corrects the league's historical
//! data problems; each override is scoped to one season.

use crate::config::LeagueConfig;
use crate::models::{ManagerName, Season, Week};
use serde::{Deserialize, Serialize};
use sleeper_client::SleeperRoster;

pub const UNKNOWN_MANAGER: &str = "Unknown Manager";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdentityOverride {
    /// Credit `from`'s weeks before `before_week` to `to`
    ManagerRename { season: Season, before_week: Week, from: String, to: String },
    /// Roster to use when `manager` owns none in the roster list
    RosterFallback { season: Season, manager: String, roster_id: u32 },
}

impl IdentityOverride {
    /// Corrections the Patriot Center league needs
    pub fn league_history() -> Vec<Self> {
        vec![
            IdentityOverride::ManagerRename {
                season: 2019,
                before_week: 4,
                from: "Cody".to_string(),
                to: "Tommy".to_string(),
            },
            IdentityOverride::RosterFallback {
                season: 2024,
                manager: "Davey".to_string(),
                roster_id: 4,
            },
        ]
    }
}

pub struct IdentityResolver<'a> {
    league: &'a LeagueConfig,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(league: &'a LeagueConfig) -> Self {
        Self { league }
    }

    pub fn manager_name(&self, display_name: &str, season: Season, week: Week) -> ManagerName {
        let name = self.league.manager_for(display_name).unwrap_or(UNKNOWN_MANAGER);

        for rule in &self.league.overrides {
            if let IdentityOverride::ManagerRename { season: s, before_week, from, to } = rule {
                if *s == season && week < *before_week && from == name {
                    return to.clone();
                }
            }
        }

        name.to_string()
    }

    /// Roster owned by `user_id`, else the manager's fallback roster for the season
    pub fn roster_id(
        &self,
        rosters: &[SleeperRoster],
        user_id: &str,
        manager: &str,
        season: Season,
    ) -> Option<u32> {
        let owned = rosters
            .iter()
            .find(|roster| roster.owner_id.as_deref() == Some(user_id))
            .map(|roster| roster.roster_id);

        owned.or_else(|| {
            self.league.overrides.iter().find_map(|rule| match rule {
                IdentityOverride::RosterFallback { season: s, manager: m, roster_id }
                    if *s == season && m == manager =>
                {
                    Some(*roster_id)
                }
                _ => None,
            })
        })
    }
}
