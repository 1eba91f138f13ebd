use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use perp_scanner::api::BinanceFuturesClient;
use perp_scanner::config::Config;
use perp_scanner::indicators::IndicatorEngine;
use perp_scanner::server;
use perp_scanner::store::SnapshotStore;
use perp_scanner::workers::{MarketScanner, ScanSettings, Scheduler};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "perp_scanner=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting perp-scanner");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: {} {} perpetuals, {} x {} candles every {}s",
        config.api_url,
        config.quote_asset,
        config.kline_limit,
        config.kline_interval,
        config.scan_interval
    );

    // Initialize API client
    let client = BinanceFuturesClient::new(
        &config.api_url,
        &config.quote_asset,
        &config.kline_interval,
        config.request_timeout(),
    )
    .context("Failed to build HTTP client")?;

    // Shared state
    let store = Arc::new(SnapshotStore::new());

    let scanner = MarketScanner::new(
        Arc::new(client),
        IndicatorEngine::new(config.indicator_params()),
        Arc::clone(&store),
        ScanSettings {
            kline_limit: config.kline_limit,
            max_concurrent: config.max_concurrent_fetches,
            request_timeout: config.request_timeout(),
        },
    );
    let scheduler = Scheduler::new(
        scanner,
        config.scan_interval(),
        config.empty_universe_backoff(),
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("API listening on http://{}", config.bind_addr);

    // Spawn workers
    let scheduler_handle = tokio::spawn(async move {
        scheduler.run().await;
    });

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, server::router(store)).await {
            error!("API server error: {}", e);
        }
    });

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        result = scheduler_handle => {
            error!("Scheduler exited unexpectedly: {:?}", result);
        }
        result = server_handle => {
            error!("API server exited unexpectedly: {:?}", result);
        }
    }

    info!("Shutting down perp-scanner");
    Ok(())
}
