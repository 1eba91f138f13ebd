use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::ScanResult;
use crate::models::{PriceHistory, TickerMap};

/// Upstream market data needed by a scan cycle.
///
/// Discovery and 24h stats degrade to empty collections on failure; only
/// per-symbol history reports an error, and that error is scoped to the symbol.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Perpetual contracts currently trading in the target quote asset
    async fn tradable_symbols(&self) -> BTreeSet<String>;

    /// 24h stats for every symbol the provider reports
    async fn ticker_stats(&self) -> TickerMap;

    /// The `limit` most recent candlesticks for `symbol`, oldest first
    async fn price_history(&self, symbol: &str, limit: usize) -> ScanResult<PriceHistory>;
}
