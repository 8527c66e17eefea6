use anyhow::Context;
use clap::Parser;
use ffwar_engine::cli::{Cli, CliHandler};
use ffwar_engine::logging::initialize_logging;
use ffwar_engine::{CachePipeline, EngineConfig};
use persistence::{create_local_persistence_with_config, PersistenceBackend};
use sleeper_client::SleeperClient;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = EngineConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(data_dir) = &cli.data_dir {
        config.storage.data_dir = data_dir.clone();
    }

    initialize_logging(&config.logging)?;
    info!(data_dir = ?config.storage.data_dir, api = %config.sleeper.api_base_url, "starting ffwar-engine");

    let client = SleeperClient::new(config.sleeper.clone());
    let mut backend = create_local_persistence_with_config(config.storage.clone())?;
    backend.initialize().await?;

    let pipeline = CachePipeline::new(&config, &client, &backend);
    let handler = CliHandler::new(pipeline, cli.current_override());

    handler.handle_command(&cli.command, chrono::Local::now().date_naive()).await
}
