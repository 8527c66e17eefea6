//! # Command Line Interface
//!
//! Update the league caches or inspect what has been stored.

use crate::models::{week_count, Season, SeasonWeek, Week};
use crate::pipeline::CachePipeline;
use crate::{ffwar::FFWAR_CACHE, replacement::REPLACEMENT_CACHE, starters::STARTERS_CACHE};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Patriot Center statistics caches
#[derive(Parser)]
#[command(name = "ffwar-engine")]
#[command(about = "Build and inspect the league starters, replacement and ffWAR caches")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding the cache files (overrides configuration)
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Skip the league lookup and treat this as the current season
    #[arg(long, requires = "current_week")]
    pub current_season: Option<Season>,

    /// Last scored week of the current season
    #[arg(long, requires = "current_season")]
    pub current_week: Option<Week>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bring every cache up to the current week
    Update,
    /// Show each cache's progress marker
    Status,
    /// Print one stored week
    Show {
        cache: CacheKind,
        season: Season,
        week: Week,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheKind {
    Starters,
    Replacement,
    Ffwar,
}

impl CacheKind {
    pub fn cache_name(self) -> &'static str {
        match self {
            CacheKind::Starters => STARTERS_CACHE,
            CacheKind::Replacement => REPLACEMENT_CACHE,
            CacheKind::Ffwar => FFWAR_CACHE,
        }
    }
}

impl Cli {
    pub fn current_override(&self) -> Option<SeasonWeek> {
        Some(SeasonWeek::new(self.current_season?, self.current_week?))
    }
}

/// CLI handler
pub struct CliHandler<'a> {
    pipeline: CachePipeline<'a>,
    current_override: Option<SeasonWeek>,
}

impl<'a> CliHandler<'a> {
    pub fn new(pipeline: CachePipeline<'a>, current_override: Option<SeasonWeek>) -> Self {
        Self { pipeline, current_override }
    }

    /// Handle CLI commands
    pub async fn handle_command(&self, command: &Commands, today: NaiveDate) -> Result<()> {
        match command {
            Commands::Update => self.update(today).await,
            Commands::Status => self.status().await,
            Commands::Show { cache, season, week } => self.show(*cache, *season, *week).await,
        }
    }

    async fn update(&self, today: NaiveDate) -> Result<()> {
        let current = match self.current_override {
            Some(current) => current,
            None => self.pipeline.resolve_current(today).await.context("resolving current season and week")?,
        };

        let caches = self.pipeline.load_or_build(current, today).await.context("updating caches")?;

        println!("Current: {current}");
        println!("  {:<26} {:>5} weeks", STARTERS_CACHE, week_count(&caches.starters));
        println!("  {:<26} {:>5} weeks", REPLACEMENT_CACHE, week_count(&caches.replacement));
        println!("  {:<26} {:>5} weeks", FFWAR_CACHE, week_count(&caches.ffwar));

        for failure in &caches.failures {
            println!("  failed: {} {}: {}", failure.cache, failure.week, failure.error);
        }

        Ok(())
    }

    async fn status(&self) -> Result<()> {
        for status in self.pipeline.status().await? {
            match status.progress {
                Some(progress) => {
                    println!("{:<26} {:>5} weeks, through {}", status.name, status.weeks, progress)
                }
                None => println!("{:<26} not built", status.name),
            }
        }
        Ok(())
    }

    async fn show(&self, cache: CacheKind, season: Season, week: Week) -> Result<()> {
        let name = cache.cache_name();
        match self.pipeline.stored_week(name, season, week).await? {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => anyhow::bail!("{name} has no entry for {season} week {week}"),
        }
        Ok(())
    }
}
