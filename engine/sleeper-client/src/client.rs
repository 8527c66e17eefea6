//! Sleeper API client and the source trait the builders depend on

use crate::config::SleeperConfig;
use crate::error::{Result, SleeperError};
use crate::models::{
    BracketMatch, LeagueInfo, PlayerMeta, SleeperMatchup, SleeperRoster, SleeperUser, WeeklyStats,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::debug;

/// Read-only view of the external stats platform.
///
/// Every method issues exactly one request. There is no retry, backoff or
/// timeout policy; a failure is returned to the caller untouched.
#[async_trait::async_trait]
pub trait StatsSource: Send + Sync {
    async fn league(&self, league_id: &str) -> Result<LeagueInfo>;

    async fn users(&self, league_id: &str) -> Result<Vec<SleeperUser>>;

    async fn rosters(&self, league_id: &str) -> Result<Vec<SleeperRoster>>;

    async fn matchups(&self, league_id: &str, week: u32) -> Result<Vec<SleeperMatchup>>;

    async fn winners_bracket(&self, league_id: &str) -> Result<Vec<BracketMatch>>;

    /// League-wide regular-season stats for one NFL week
    async fn weekly_stats(&self, season: i32, week: u32) -> Result<WeeklyStats>;

    /// Full NFL player directory keyed by player id
    async fn players(&self) -> Result<HashMap<String, PlayerMeta>>;
}

/// Sleeper API client
#[derive(Debug, Clone)]
pub struct SleeperClient {
    config: SleeperConfig,
    client: reqwest::Client,
}

impl SleeperClient {
    /// Create a new Sleeper API client
    pub fn new(config: SleeperConfig) -> Self {
        Self { config, client: reqwest::Client::new() }
    }

    pub fn config(&self) -> &SleeperConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| SleeperError::Http { url: url.clone(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SleeperError::Status { url, status: status.as_u16() });
        }

        let body = response
            .text()
            .await
            .map_err(|source| SleeperError::Http { url: url.clone(), source })?;

        serde_json::from_str(&body).map_err(|source| SleeperError::Decode { url, source })
    }

    /// Like `get_json`, but a JSON `null` body decodes to an empty collection
    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let list: Option<Vec<T>> = self.get_json(path).await?;
        Ok(list.unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl StatsSource for SleeperClient {
    async fn league(&self, league_id: &str) -> Result<LeagueInfo> {
        self.get_json(&format!("league/{}", league_id)).await
    }

    async fn users(&self, league_id: &str) -> Result<Vec<SleeperUser>> {
        self.get_list(&format!("league/{}/users", league_id)).await
    }

    async fn rosters(&self, league_id: &str) -> Result<Vec<SleeperRoster>> {
        self.get_list(&format!("league/{}/rosters", league_id)).await
    }

    async fn matchups(&self, league_id: &str, week: u32) -> Result<Vec<SleeperMatchup>> {
        self.get_list(&format!("league/{}/matchups/{}", league_id, week)).await
    }

    async fn winners_bracket(&self, league_id: &str) -> Result<Vec<BracketMatch>> {
        self.get_list(&format!("league/{}/winners_bracket", league_id)).await
    }

    async fn weekly_stats(&self, season: i32, week: u32) -> Result<WeeklyStats> {
        let stats: Option<WeeklyStats> =
            self.get_json(&format!("stats/nfl/regular/{}/{}", season, week)).await?;
        Ok(stats.unwrap_or_default())
    }

    async fn players(&self) -> Result<HashMap<String, PlayerMeta>> {
        self.get_json("players/nfl").await
    }
}
