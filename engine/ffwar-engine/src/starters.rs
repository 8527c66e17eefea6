//! Starters cache: each manager's starting lineup and points per week

use crate::config::{LeagueConfig, ScheduleConfig};
use crate::error::{EngineError, Result};
use crate::identity::IdentityResolver;
use crate::models::{
    ManagerWeek, PlayerWeekRecord, Season, SeasonWeek, SeasonWeekMap, StartersWeek, Week,
};
use crate::orchestrator::{WeekPolicy, WeeklyBuilder};
use crate::players::PlayerDirectory;
use sleeper_client::{BracketMatch, SleeperMatchup, StatsSource};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

pub const STARTERS_CACHE: &str = "starters_cache";

/// Deepest playoff round the league plays
const MAX_PLAYOFF_ROUND: Week = 3;
const CHAMPIONSHIP: u32 = 1;
const THIRD_PLACE_GAME: u32 = 3;
const FIFTH_PLACE_GAME: u32 = 5;

/// Winners-bracket facts for one playoff week
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayoffContext {
    /// Rosters with a winners-bracket game this round
    pub round_roster_ids: BTreeSet<u32>,
    pub first_place: u32,
    pub second_place: u32,
    pub third_place: u32,
}

impl PlayoffContext {
    pub fn from_bracket(bracket: &[BracketMatch], round: Week, season: Season, week: Week) -> Result<Self> {
        let round_roster_ids: BTreeSet<u32> = bracket
            .iter()
            .filter(|m| m.r == round && m.p != Some(FIFTH_PLACE_GAME))
            .flat_map(BracketMatch::roster_ids)
            .collect();
        if round_roster_ids.is_empty() {
            return Err(EngineError::NoPlayoffRosters { season, week });
        }

        let game = |tag: u32| bracket.iter().find(|m| m.p == Some(tag));
        let championship = game(CHAMPIONSHIP);
        let (first_place, second_place, third_place) = match (
            championship.and_then(|m| m.w),
            championship.and_then(|m| m.l),
            game(THIRD_PLACE_GAME).and_then(|m| m.w),
        ) {
            (Some(first), Some(second), Some(third)) => (first, second, third),
            _ => return Err(EngineError::PlacementUnavailable { season }),
        };

        Ok(Self { round_roster_ids, first_place, second_place, third_place })
    }

    pub fn placement(&self, roster_id: u32) -> Option<u8> {
        if roster_id == self.first_place {
            Some(1)
        } else if roster_id == self.second_place {
            Some(2)
        } else if roster_id == self.third_place {
            Some(3)
        } else {
            None
        }
    }
}

/// Starters and points for one roster, `None` if the roster has no matchup
pub fn starters_for_roster(
    matchups: &[SleeperMatchup],
    roster_id: u32,
    players: &PlayerDirectory,
    placement: Option<u8>,
) -> Option<ManagerWeek> {
    let matchup = matchups.iter().find(|m| m.roster_id == roster_id)?;

    let mut records = BTreeMap::new();
    for player_id in &matchup.starters {
        let Some((name, position)) = players.name_and_position(player_id) else {
            continue;
        };
        records.insert(
            name.to_string(),
            PlayerWeekRecord {
                points: matchup.points_for(player_id),
                position,
                player_id: player_id.clone(),
                placement,
            },
        );
    }

    Some(ManagerWeek::from_players(records))
}

pub struct StartersBuilder<'a> {
    source: &'a dyn StatsSource,
    league: &'a LeagueConfig,
    schedule: &'a ScheduleConfig,
    players: &'a PlayerDirectory,
}

impl<'a> StartersBuilder<'a> {
    pub fn new(
        source: &'a dyn StatsSource,
        league: &'a LeagueConfig,
        schedule: &'a ScheduleConfig,
        players: &'a PlayerDirectory,
    ) -> Self {
        Self { source, league, schedule, players }
    }

    /// Bracket facts for playoff weeks, `None` during the regular season
    pub async fn playoff_context(&self, league_id: &str, at: SeasonWeek) -> Result<Option<PlayoffContext>> {
        let regular_season = self.schedule.regular_season_weeks(at.season);
        if at.week <= regular_season {
            return Ok(None);
        }

        let round = at.week - regular_season;
        if round > MAX_PLAYOFF_ROUND {
            return Err(EngineError::UnsupportedPlayoffRound { season: at.season, week: at.week, round });
        }

        let bracket = self.source.winners_bracket(league_id).await?;
        PlayoffContext::from_bracket(&bracket, round, at.season, at.week).map(Some)
    }

    pub async fn fetch_week(&self, at: SeasonWeek) -> Result<StartersWeek> {
        let league_id = self.league.league_id(at.season)?;

        let users = self.source.users(league_id).await?;
        let rosters = self.source.rosters(league_id).await?;
        let matchups = self.source.matchups(league_id, at.week).await?;
        let playoff = self.playoff_context(league_id, at).await?;

        let resolver = IdentityResolver::new(self.league);
        let mut week = StartersWeek::new();
        for user in &users {
            let manager = resolver.manager_name(&user.display_name, at.season, at.week);

            let Some(roster_id) = resolver.roster_id(&rosters, &user.user_id, &manager, at.season) else {
                debug!(%manager, season = at.season, week = at.week, "no roster for manager, skipping");
                continue;
            };

            let placement = match &playoff {
                Some(ctx) if !ctx.round_roster_ids.contains(&roster_id) => continue,
                Some(ctx) => ctx.placement(roster_id),
                None => None,
            };

            if let Some(starters) = starters_for_roster(&matchups, roster_id, self.players, placement) {
                week.insert(manager, starters);
            }
        }

        Ok(week)
    }
}

#[async_trait::async_trait]
impl WeeklyBuilder for StartersBuilder<'_> {
    type Output = StartersWeek;

    fn cache_name(&self) -> &'static str {
        STARTERS_CACHE
    }

    fn seasons(&self) -> Vec<Season> {
        self.league.season_years()
    }

    fn policy(&self) -> WeekPolicy {
        self.schedule.starters
    }

    async fn build_week(&self, week: SeasonWeek, _history: &SeasonWeekMap<StartersWeek>) -> Result<StartersWeek> {
        self.fetch_week(week).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;
    use crate::testing::FakeStatsSource;
    use chrono::NaiveDate;

    const LEAGUE_2024: &str = "1113631749025796096";
    const LEAGUE_2019: &str = "399260536505671680";

    fn directory(source: &FakeStatsSource) -> PlayerDirectory {
        let day = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        PlayerDirectory::new(day, source.player_directory())
    }

    fn bracket() -> Vec<BracketMatch> {
        vec![
            BracketMatch { r: 1, w: Some(1), l: Some(2), ..Default::default() },
            BracketMatch { r: 1, w: Some(3), l: Some(4), ..Default::default() },
            BracketMatch { r: 1, w: Some(7), l: Some(8), p: Some(5), ..Default::default() },
            BracketMatch { r: 2, w: Some(1), l: Some(3), ..Default::default() },
            BracketMatch { r: 3, w: Some(1), l: Some(3), p: Some(1), ..Default::default() },
            BracketMatch { r: 3, w: Some(4), l: Some(5), p: Some(3), ..Default::default() },
        ]
    }

    fn players() -> FakeStatsSource {
        FakeStatsSource::new()
            .with_player("4046", "Patrick Mahomes", "QB")
            .with_player("4035", "Alvin Kamara", "RB")
            .with_player("5859", "A.J. Brown", "WR")
            .with_player("9001", "Nameless Position", "")
    }

    #[test]
    fn test_playoff_context_from_bracket() {
        let ctx = PlayoffContext::from_bracket(&bracket(), 1, 2021, 15).unwrap();
        assert_eq!(ctx.round_roster_ids, BTreeSet::from([1, 2, 3, 4]));
        assert_eq!((ctx.first_place, ctx.second_place, ctx.third_place), (1, 3, 4));
        assert_eq!(ctx.placement(3), Some(2));
        assert_eq!(ctx.placement(2), None);
    }

    #[test]
    fn test_playoff_context_errors() {
        assert!(matches!(
            PlayoffContext::from_bracket(&[], 1, 2024, 15),
            Err(EngineError::NoPlayoffRosters { .. })
        ));

        let undecided = vec![
            BracketMatch { r: 1, w: Some(1), l: Some(2), ..Default::default() },
            BracketMatch { r: 1, w: Some(3), l: Some(4), ..Default::default() },
        ];
        assert!(matches!(
            PlayoffContext::from_bracket(&undecided, 1, 2024, 15),
            Err(EngineError::PlacementUnavailable { season: 2024 })
        ));
    }

    #[test]
    fn test_starters_skip_unknown_players_and_default_points() {
        let source = players()
            .with_matchup(LEAGUE_2024, 1, 1, &[("4046", Some(22.1)), ("4035", None), ("0", None), ("9001", Some(5.0))]);
        let directory = directory(&source);
        let matchups = source_matchups(&source, 1);

        let week = starters_for_roster(&matchups, 1, &directory, None).unwrap();
        assert_eq!(week.players.len(), 2);
        assert_eq!(week.players["Alvin Kamara"].points, 0.0);
        assert_eq!(week.players["Patrick Mahomes"].position, Position::QB);
        assert_eq!(week.total_points, 22.1);

        assert!(starters_for_roster(&matchups, 2, &directory, None).is_none());
    }

    fn source_matchups(source: &FakeStatsSource, week: u32) -> Vec<SleeperMatchup> {
        tokio_test::block_on(source.matchups(LEAGUE_2024, week)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_regular_season_week() {
        let source = players()
            .with_user(LEAGUE_2024, "u1", "tommylowry")
            .with_user(LEAGUE_2024, "u2", "dpereira7")
            .with_user(LEAGUE_2024, "u3", "ghost")
            .with_roster(LEAGUE_2024, 1, Some("u1"))
            .with_roster(LEAGUE_2024, 4, None)
            .with_matchup(LEAGUE_2024, 3, 1, &[("4046", Some(18.4)), ("5859", Some(11.35))])
            .with_matchup(LEAGUE_2024, 3, 4, &[("4035", Some(9.9))]);
        let directory = directory(&source);
        let league = LeagueConfig::default();
        let schedule = ScheduleConfig::default();
        let builder = StartersBuilder::new(&source, &league, &schedule, &directory);

        let week = builder.fetch_week(SeasonWeek::new(2024, 3)).await.unwrap();

        assert_eq!(week.keys().collect::<Vec<_>>(), vec!["Davey", "Tommy"]);
        assert_eq!(week["Tommy"].total_points, 29.75);
        assert_eq!(week["Davey"].players["Alvin Kamara"].points, 9.9);
        assert!(week["Tommy"].players.values().all(|r| r.placement.is_none()));
        assert!(!source.calls().iter().any(|c| c.starts_with("winners_bracket")));
    }

    #[tokio::test]
    async fn test_early_2019_weeks_credit_renamed_manager() {
        let source = players()
            .with_user(LEAGUE_2019, "u5", "codestoppable")
            .with_roster(LEAGUE_2019, 5, Some("u5"))
            .with_matchup(LEAGUE_2019, 2, 5, &[("4046", Some(10.0))])
            .with_matchup(LEAGUE_2019, 4, 5, &[("4046", Some(12.0))]);
        let directory = directory(&source);
        let league = LeagueConfig::default();
        let schedule = ScheduleConfig::default();
        let builder = StartersBuilder::new(&source, &league, &schedule, &directory);

        let early = builder.fetch_week(SeasonWeek::new(2019, 2)).await.unwrap();
        let later = builder.fetch_week(SeasonWeek::new(2019, 4)).await.unwrap();

        assert!(early.contains_key("Tommy"));
        assert!(later.contains_key("Cody"));
    }

    #[tokio::test]
    async fn test_playoff_week_keeps_bracket_rosters_and_marks_placement() {
        let mut source = players().with_bracket(LEAGUE_2024, bracket());
        let owners = [("u1", "tommylowry"), ("u2", "aalvaa"), ("u3", "bbennick"), ("u4", "mitchwest"), ("u7", "owen0010")];
        for (roster_id, (user, name)) in [1, 2, 3, 4, 7].into_iter().zip(owners) {
            source = source
                .with_user(LEAGUE_2024, user, name)
                .with_roster(LEAGUE_2024, roster_id, Some(user))
                .with_matchup(LEAGUE_2024, 15, roster_id, &[("4046", Some(roster_id as f64))]);
        }
        let directory = directory(&source);
        let league = LeagueConfig::default();
        let schedule = ScheduleConfig::default();
        let builder = StartersBuilder::new(&source, &league, &schedule, &directory);

        let week = builder.fetch_week(SeasonWeek::new(2024, 15)).await.unwrap();

        assert_eq!(week.len(), 4);
        assert!(!week.contains_key("Owen"));
        assert_eq!(week["Tommy"].players["Patrick Mahomes"].placement, Some(1));
        assert_eq!(week["Benz"].players["Patrick Mahomes"].placement, Some(2));
        assert_eq!(week["Mitch"].players["Patrick Mahomes"].placement, Some(3));
        assert_eq!(week["Anthony"].players["Patrick Mahomes"].placement, None);
    }

    #[tokio::test]
    async fn test_round_four_is_rejected_before_fetching_bracket() {
        let source = players();
        let directory = directory(&source);
        let league = LeagueConfig::default();
        let schedule = ScheduleConfig::default();
        let builder = StartersBuilder::new(&source, &league, &schedule, &directory);

        let err = builder.playoff_context(LEAGUE_2019, SeasonWeek::new(2019, 17)).await.unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedPlayoffRound { round: 4, .. }));
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_call_fails_the_whole_week() {
        let source = players()
            .with_user(LEAGUE_2024, "u1", "tommylowry")
            .with_roster(LEAGUE_2024, 1, Some("u1"))
            .failing(&format!("matchups:{LEAGUE_2024}:3"));
        let directory = directory(&source);
        let league = LeagueConfig::default();
        let schedule = ScheduleConfig::default();
        let builder = StartersBuilder::new(&source, &league, &schedule, &directory);

        let err = builder.fetch_week(SeasonWeek::new(2024, 3)).await.unwrap_err();
        assert!(matches!(err, EngineError::Upstream(_)));
    }
}
