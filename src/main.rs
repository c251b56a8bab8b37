//! Main entry point for the sui-wrapped API server

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use sui_wrapped::server::{self, AppState};
use sui_wrapped::wrapped::{
    GraphQlTransport, LeaderboardRecord, LeaderboardWriter, MetricsCollector, SqliteLeaderboard,
    WrappedBuilder,
};
use tokio::sync::mpsc;
use tracing::{info, warn, Level};

/// How long the leaderboard writer may drain its queue on shutdown.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Starting sui-wrapped");

    let config = sui_wrapped::config::load_from_env()?;
    let metrics = MetricsCollector::new();

    // Leaderboard storage and its writer task
    let storage = SqliteLeaderboard::new(&config.database_url, 5).await?;
    let (record_sender, record_receiver) =
        mpsc::channel::<LeaderboardRecord>(config.leaderboard_channel_capacity);
    let writer = LeaderboardWriter::new(
        storage.clone(),
        record_receiver,
        config.leaderboard_write_timeout(),
        metrics.clone(),
    );
    let writer_handle = tokio::spawn(writer.run());

    // Indexer transport and summary pipeline
    let transport = GraphQlTransport::new(
        config.indexer_endpoints.clone(),
        config.indexer_timeout(),
        config.indexer_retry_attempts,
        config.indexer_requests_per_second,
    )?;
    info!(
        "Indexer endpoints: {:?}",
        transport.endpoints().iter().collect::<Vec<_>>()
    );
    let summaries = WrappedBuilder::from_config(config.clone()).build(Arc::new(transport), metrics.clone());

    let state = Arc::new(AppState::new(
        &config,
        Arc::new(summaries),
        storage,
        record_sender,
        metrics,
    ));

    server::run_server(&config.listen_addr, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    })
    .await?;

    // The router owned the last record sender; the writer now drains and exits.
    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer_handle).await.is_err() {
        warn!("Leaderboard writer did not drain within {:?}", WRITER_DRAIN_TIMEOUT);
    }

    info!("sui-wrapped stopped");
    Ok(())
}
