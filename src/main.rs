use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

mod config;
mod dashboard;
mod feed;
mod store;
mod view;

use config::Config;
use dashboard::AppState;
use feed::{start_feed_poller, FeedPoller, HttpFeed};
use store::models::Badge;
use store::Database;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    // Open database
    let db = Database::open(&config.database_path)?;
    info!("Database opened: {}", config.database_path);

    // Build the feed client
    let provider = Arc::new(HttpFeed::new(&config.feed_url)?);
    info!("Polling {} every {}s", config.feed_url, config.poll_interval_secs);

    let opts = config.view_options();

    // Badge + "snapshot changed" channels shared with the dashboard
    let (badge_tx, badge_rx) = watch::channel(Badge::default());
    let (updated_tx, updated_rx) = watch::channel(None);

    // Start the poller (startup fetch, periodic ticks, refresh commands)
    let poller = FeedPoller::new(provider, db.clone(), opts.window, badge_tx, updated_tx);
    let cmd_tx = start_feed_poller(poller, Duration::from_secs(config.poll_interval_secs));

    // Start the dashboard HTTP server
    let state = AppState {
        db,
        cmd_tx,
        badge_rx,
        updated_rx,
        opts,
        image_base_url: config.image_base_url.clone(),
    };
    let app = dashboard::router(state);
    let addr: SocketAddr = config.dashboard_addr.parse()?;
    info!("Dashboard listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run dashboard server (blocks until shutdown)
    axum::serve(listener, app).await?;

    Ok(())
}
