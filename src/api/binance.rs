use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::MarketDataSource;
use crate::error::{ScanError, ScanResult};
use crate::models::{PriceBar, PriceHistory, TickerMap, TickerStats};

const CONTRACT_PERPETUAL: &str = "PERPETUAL";
const STATUS_TRADING: &str = "TRADING";

/// Client for the Binance USDT-M futures REST API
pub struct BinanceFuturesClient {
    client: Client,
    base_url: String,
    quote_asset: String,
    interval: String,
}

/// `/fapi/v1/exchangeInfo` response (only what we filter on)
#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<InstrumentInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstrumentInfo {
    symbol: String,
    #[serde(default)]
    contract_type: String,
    #[serde(default)]
    status: String,
}

/// Entry of the `/fapi/v1/ticker/24hr` list; numbers arrive as strings
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24h {
    symbol: String,
    #[serde(default)]
    price_change_percent: Option<String>,
    #[serde(default)]
    quote_volume: Option<String>,
}

impl BinanceFuturesClient {
    /// Create a new client with a per-request timeout
    pub fn new(
        base_url: &str,
        quote_asset: &str,
        interval: &str,
        timeout: Duration,
    ) -> ScanResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            quote_asset: quote_asset.to_string(),
            interval: interval.to_string(),
        })
    }

    async fn get(&self, url: &str) -> ScanResult<Response> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ScanError::UpstreamRejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn fetch_exchange_info(&self) -> ScanResult<ExchangeInfo> {
        let url = format!("{}/fapi/v1/exchangeInfo", self.base_url);
        Ok(self.get(&url).await?.json().await?)
    }

    async fn fetch_tickers(&self) -> ScanResult<Vec<Ticker24h>> {
        let url = format!("{}/fapi/v1/ticker/24hr", self.base_url);
        Ok(self.get(&url).await?.json().await?)
    }
}

#[async_trait]
impl MarketDataSource for BinanceFuturesClient {
    async fn tradable_symbols(&self) -> BTreeSet<String> {
        match self.fetch_exchange_info().await {
            Ok(info) => {
                let symbols = filter_tradable(info.symbols, &self.quote_asset);
                info!("Found {} tradable {} perpetuals", symbols.len(), self.quote_asset);
                symbols
            }
            Err(e) => {
                error!("Failed to fetch exchange info: {}", e);
                BTreeSet::new()
            }
        }
    }

    async fn ticker_stats(&self) -> TickerMap {
        match self.fetch_tickers().await {
            Ok(tickers) => tickers
                .into_iter()
                .map(convert_ticker)
                .map(|t| (t.symbol.clone(), t))
                .collect(),
            Err(e) => {
                warn!("Failed to fetch 24h tickers, change/volume will read zero: {}", e);
                TickerMap::new()
            }
        }
    }

    async fn price_history(&self, symbol: &str, limit: usize) -> ScanResult<PriceHistory> {
        let url = format!(
            "{}/fapi/v1/klines?symbol={}&interval={}&limit={}",
            self.base_url,
            urlencoding::encode(symbol),
            urlencoding::encode(&self.interval),
            limit
        );

        let rows: Vec<Vec<Value>> = self.get(&url).await?.json().await?;
        parse_klines(symbol, &rows)
    }
}

fn filter_tradable(instruments: Vec<InstrumentInfo>, quote_asset: &str) -> BTreeSet<String> {
    instruments
        .into_iter()
        .filter(|i| {
            i.contract_type == CONTRACT_PERPETUAL
                && i.status == STATUS_TRADING
                && i.symbol.ends_with(quote_asset)
        })
        .map(|i| i.symbol)
        .collect()
}

/// Unparseable numbers read as zero rather than dropping the symbol
fn convert_ticker(ticker: Ticker24h) -> TickerStats {
    let parse = |raw: Option<String>| {
        raw.and_then(|s| s.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    };

    TickerStats {
        price_change_percent: parse(ticker.price_change_percent),
        quote_volume: parse(ticker.quote_volume),
        symbol: ticker.symbol,
    }
}

fn parse_klines(symbol: &str, rows: &[Vec<Value>]) -> ScanResult<PriceHistory> {
    let bars = rows
        .iter()
        .map(|row| PriceBar::from_row(row))
        .collect::<ScanResult<Vec<_>>>()?;
    Ok(PriceHistory::new(symbol, bars))
}
