use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use perp_scanner::api::BinanceFuturesClient;
use perp_scanner::config::Config;
use perp_scanner::indicators::IndicatorEngine;
use perp_scanner::models::SymbolRecord;
use perp_scanner::store::SnapshotStore;
use perp_scanner::workers::{MarketScanner, ScanSettings};

#[derive(Debug, Default)]
struct Args {
    json: bool,
    signals_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scan_once=info,perp_scanner=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = parse_args(&env::args().collect::<Vec<_>>());
    let config = Config::from_env()?;

    let client = BinanceFuturesClient::new(
        &config.api_url,
        &config.quote_asset,
        &config.kline_interval,
        config.request_timeout(),
    )
    .context("Failed to build HTTP client")?;

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

    let report = scanner.run_cycle().await.context("Scan cycle failed")?;
    info!(
        "Scanned {} symbols: {} published, {} omitted",
        report.universe,
        report.published,
        report.omitted.len()
    );
    for omission in &report.omitted {
        info!("  {} skipped: {}", omission.symbol, omission.reason);
    }

    let snapshot = store.get();
    let records: Vec<&SymbolRecord> = snapshot
        .records()
        .filter(|r| !args.signals_only || !r.signals.is_empty())
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print_table(&records);
    }

    Ok(())
}

/// Parse --json / --signals-only flags
fn parse_args(args: &[String]) -> Args {
    let mut parsed = Args::default();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--json" | "-j" => parsed.json = true,
            "--signals-only" | "-s" => parsed.signals_only = true,
            _ => {}
        }
    }
    parsed
}

fn print_table(records: &[&SymbolRecord]) {
    println!(
        "{:<16} {:>14} {:>9} {:>10} {:>7} {:>12} {:>12} {:>10} {:>10}  SIGNALS",
        "SYMBOL", "PRICE", "CHANGE", "VOLUME", "RSI", "BB LOWER", "BB UPPER", "MACD", "SIGNAL"
    );
    for r in records {
        let signals: Vec<&str> = r.signals.iter().map(|s| s.label()).collect();
        println!(
            "{:<16} {:>14} {:>9} {:>10} {:>7} {:>12} {:>12} {:>10} {:>10}  {}",
            r.symbol,
            r.price,
            r.change,
            r.quote_volume,
            r.rsi,
            r.bbl,
            r.bbu,
            r.macd,
            r.macds,
            signals.join(", ")
        );
    }
}
