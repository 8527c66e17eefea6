//! In-memory stats source for tests

use sleeper_client::{
    BracketMatch, LeagueInfo, LeagueSettings, PlayerMeta, PlayerStatLine, SleeperError,
    SleeperMatchup, SleeperRoster, SleeperUser, StatsSource, WeeklyStats,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Serves canned payloads and records every call as `endpoint:args`
#[derive(Default)]
pub struct FakeStatsSource {
    leagues: HashMap<String, LeagueInfo>,
    users: HashMap<String, Vec<SleeperUser>>,
    rosters: HashMap<String, Vec<SleeperRoster>>,
    matchups: HashMap<(String, u32), Vec<SleeperMatchup>>,
    brackets: HashMap<String, Vec<BracketMatch>>,
    stats: HashMap<(i32, u32), WeeklyStats>,
    players: HashMap<String, PlayerMeta>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeStatsSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_league(mut self, league_id: &str, season: i32, last_scored_leg: u32) -> Self {
        self.leagues.insert(
            league_id.to_string(),
            LeagueInfo {
                league_id: league_id.to_string(),
                season: season.to_string(),
                settings: LeagueSettings { last_scored_leg, playoff_week_start: None },
            },
        );
        self
    }

    pub fn with_user(mut self, league_id: &str, user_id: &str, display_name: &str) -> Self {
        self.users.entry(league_id.to_string()).or_default().push(SleeperUser {
            user_id: user_id.to_string(),
            display_name: display_name.to_string(),
        });
        self
    }

    pub fn with_roster(mut self, league_id: &str, roster_id: u32, owner_id: Option<&str>) -> Self {
        self.rosters
            .entry(league_id.to_string())
            .or_default()
            .push(SleeperRoster { roster_id, owner_id: owner_id.map(str::to_string) });
        self
    }

    /// Starters in slot order with their points; a `None` score leaves the
    /// player out of `players_points`
    pub fn with_matchup(
        mut self,
        league_id: &str,
        week: u32,
        roster_id: u32,
        starters: &[(&str, Option<f64>)],
    ) -> Self {
        let matchup = SleeperMatchup {
            roster_id,
            matchup_id: None,
            starters: starters.iter().map(|(id, _)| id.to_string()).collect(),
            players_points: starters
                .iter()
                .filter_map(|(id, points)| points.map(|p| (id.to_string(), p)))
                .collect(),
            points: None,
        };
        self.matchups.entry((league_id.to_string(), week)).or_default().push(matchup);
        self
    }

    pub fn with_bracket(mut self, league_id: &str, bracket: Vec<BracketMatch>) -> Self {
        self.brackets.insert(league_id.to_string(), bracket);
        self
    }

    /// Stat lines as (player id, half-PPR points, games played)
    pub fn with_stats(mut self, season: i32, week: u32, lines: &[(&str, Option<f64>, Option<f64>)]) -> Self {
        let stats = self.stats.entry((season, week)).or_default();
        for (id, pts_half_ppr, gp) in lines {
            stats.insert(id.to_string(), PlayerStatLine { pts_half_ppr: *pts_half_ppr, gp: *gp });
        }
        self
    }

    pub fn with_player(mut self, player_id: &str, full_name: &str, position: &str) -> Self {
        self.players.insert(
            player_id.to_string(),
            PlayerMeta {
                full_name: Some(full_name.to_string()),
                position: Some(position.to_string()),
                ..Default::default()
            },
        );
        self
    }

    /// Make the call with this key fail
    pub fn failing(mut self, call: &str) -> Self {
        self.failing.insert(call.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn player_directory(&self) -> HashMap<String, PlayerMeta> {
        self.players.clone()
    }

    fn record(&self, call: String) -> sleeper_client::Result<()> {
        let fail = self.failing.contains(&call);
        self.calls.lock().unwrap().push(call.clone());
        if fail {
            return Err(SleeperError::Status { url: call, status: 503 });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl StatsSource for FakeStatsSource {
    async fn league(&self, league_id: &str) -> sleeper_client::Result<LeagueInfo> {
        self.record(format!("league:{league_id}"))?;
        self.leagues
            .get(league_id)
            .cloned()
            .ok_or_else(|| SleeperError::api(format!("unknown league {league_id}")))
    }

    async fn users(&self, league_id: &str) -> sleeper_client::Result<Vec<SleeperUser>> {
        self.record(format!("users:{league_id}"))?;
        Ok(self.users.get(league_id).cloned().unwrap_or_default())
    }

    async fn rosters(&self, league_id: &str) -> sleeper_client::Result<Vec<SleeperRoster>> {
        self.record(format!("rosters:{league_id}"))?;
        Ok(self.rosters.get(league_id).cloned().unwrap_or_default())
    }

    async fn matchups(&self, league_id: &str, week: u32) -> sleeper_client::Result<Vec<SleeperMatchup>> {
        self.record(format!("matchups:{league_id}:{week}"))?;
        Ok(self.matchups.get(&(league_id.to_string(), week)).cloned().unwrap_or_default())
    }

    async fn winners_bracket(&self, league_id: &str) -> sleeper_client::Result<Vec<BracketMatch>> {
        self.record(format!("winners_bracket:{league_id}"))?;
        Ok(self.brackets.get(league_id).cloned().unwrap_or_default())
    }

    async fn weekly_stats(&self, season: i32, week: u32) -> sleeper_client::Result<WeeklyStats> {
        self.record(format!("weekly_stats:{season}:{week}"))?;
        Ok(self.stats.get(&(season, week)).cloned().unwrap_or_default())
    }

    async fn players(&self) -> sleeper_client::Result<HashMap<String, PlayerMeta>> {
        self.record("players".to_string())?;
        Ok(self.players.clone())
    }
}
