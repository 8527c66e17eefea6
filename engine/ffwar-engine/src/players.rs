//! Player directory: player id → name and position
//!
//! Stored as its own structure and refreshed from the platform once it is a
//! week old. Team defenses are not real players on the platform side, so a
//! synthetic `DEF` entry keyed by team code is kept for each franchise.

use crate::error::Result;
use crate::models::Position;
use chrono::NaiveDate;
use persistence::PersistenceBackend;
use serde::{Deserialize, Serialize};
use sleeper_client::{PlayerMeta, StatsSource};
use std::collections::HashMap;
use tracing::{info, warn};

pub const PLAYER_DIRECTORY: &str = "player_ids";

const REFRESH_AFTER_DAYS: i64 = 7;

/// Team codes as the platform reports them, including relocated franchises
const TEAM_DEFENSES: [(&str, &str); 34] = [
    ("SEA", "Seattle Seahawks"),
    ("CHI", "Chicago Bears"),
    ("NE", "New England Patriots"),
    ("DAL", "Dallas Cowboys"),
    ("GB", "Green Bay Packers"),
    ("KC", "Kansas City Chiefs"),
    ("SF", "San Francisco 49ers"),
    ("PIT", "Pittsburgh Steelers"),
    ("PHI", "Philadelphia Eagles"),
    ("BUF", "Buffalo Bills"),
    ("NYG", "New York Giants"),
    ("NYJ", "New York Jets"),
    ("MIA", "Miami Dolphins"),
    ("MIN", "Minnesota Vikings"),
    ("DEN", "Denver Broncos"),
    ("CLE", "Cleveland Browns"),
    ("CIN", "Cincinnati Bengals"),
    ("BAL", "Baltimore Ravens"),
    ("LAR", "Los Angeles Rams"),
    ("LAC", "Los Angeles Chargers"),
    ("SD", "Los Angeles Chargers"),
    ("ARI", "Arizona Cardinals"),
    ("ATL", "Atlanta Falcons"),
    ("CAR", "Carolina Panthers"),
    ("DET", "Detroit Lions"),
    ("HOU", "Houston Texans"),
    ("IND", "Indianapolis Colts"),
    ("JAX", "Jacksonville Jaguars"),
    ("LV", "Las Vegas Raiders"),
    ("OAK", "Las Vegas Raiders"),
    ("NO", "New Orleans Saints"),
    ("TB", "Tampa Bay Buccaneers"),
    ("TEN", "Tennessee Titans"),
    ("WAS", "Washington Commanders"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerDirectory {
    pub last_updated: NaiveDate,
    pub players: HashMap<String, PlayerMeta>,
}

impl PlayerDirectory {
    pub fn new(last_updated: NaiveDate, players: HashMap<String, PlayerMeta>) -> Self {
        let mut directory = Self { last_updated, players };
        directory.ensure_defenses();
        directory
    }

    pub fn get(&self, player_id: &str) -> Option<&PlayerMeta> {
        self.players.get(player_id)
    }

    /// Name and position, `None` when either is unknown
    pub fn name_and_position(&self, player_id: &str) -> Option<(&str, Position)> {
        let meta = self.players.get(player_id)?;
        let name = meta.full_name.as_deref().filter(|n| !n.is_empty())?;
        let position = meta.position.as_deref()?.parse().ok()?;
        Some((name, position))
    }

    pub fn position_of(&self, player_id: &str) -> Option<Position> {
        self.players.get(player_id)?.position.as_deref()?.parse().ok()
    }

    pub fn is_stale(&self, today: NaiveDate) -> bool {
        (today - self.last_updated).num_days() >= REFRESH_AFTER_DAYS
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    fn ensure_defenses(&mut self) {
        for (code, name) in TEAM_DEFENSES {
            self.players.insert(
                code.to_string(),
                PlayerMeta {
                    full_name: Some(name.to_string()),
                    position: Some("DEF".to_string()),
                    team: Some(code.to_string()),
                    ..Default::default()
                },
            );
        }
    }

    /// Reuse the stored directory while it is fresh, otherwise refetch and store it
    pub async fn load_or_refresh(
        source: &dyn StatsSource,
        backend: &dyn PersistenceBackend,
        today: NaiveDate,
    ) -> Result<Self> {
        if let Some(bytes) = backend.read(PLAYER_DIRECTORY).await? {
            match serde_json::from_slice::<PlayerDirectory>(&bytes) {
                Ok(mut directory) if !directory.is_stale(today) => {
                    directory.ensure_defenses();
                    return Ok(directory);
                }
                Ok(directory) => {
                    info!(last_updated = %directory.last_updated, "player directory is stale, refreshing");
                }
                Err(e) => warn!(error = %e, "player directory unreadable, refreshing"),
            }
        }

        let directory = Self::new(today, source.players().await?);

        let bytes = if backend.config().pretty {
            serde_json::to_vec_pretty(&directory)
        } else {
            serde_json::to_vec(&directory)
        }
        .map_err(persistence::PersistenceError::from)?;
        backend.write(PLAYER_DIRECTORY, &bytes).await?;

        info!(players = directory.len(), "player directory refreshed");
        Ok(directory)
    }
}
