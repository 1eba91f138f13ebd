use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::indicators::{IndicatorEngine, IndicatorParams};

/// Most candles the klines endpoint returns per request
pub const MAX_KLINE_LIMIT: usize = 1500;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Binance USDT-M futures REST base URL
    pub api_url: String,

    /// Quote asset a symbol must be denominated in (e.g. USDT)
    pub quote_asset: String,

    /// Candlestick interval requested for every symbol
    pub kline_interval: String,

    /// Number of candlesticks fetched per symbol
    pub kline_limit: usize,

    /// Interval in seconds between the starts of two scan cycles
    pub scan_interval: u64,

    /// Cooldown in seconds after a cycle that found no symbols
    pub empty_universe_backoff: u64,

    /// Ceiling on in-flight per-symbol tasks
    pub max_concurrent_fetches: usize,

    /// Timeout in seconds applied to every upstream request
    pub request_timeout: u64,

    pub rsi_period: usize,
    pub bb_period: usize,
    pub bb_std_dev: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,

    /// Listen address of the read-only API
    pub bind_addr: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            api_url: env::var("BINANCE_FAPI_URL")
                .unwrap_or_else(|_| "https://fapi.binance.com".to_string()),
            quote_asset: env::var("QUOTE_ASSET").unwrap_or_else(|_| "USDT".to_string()),
            kline_interval: env::var("KLINE_INTERVAL").unwrap_or_else(|_| "12h".to_string()),
            kline_limit: parse_var("KLINE_LIMIT", 200)?,
            scan_interval: parse_var("SCAN_INTERVAL_SECS", 900)?,
            empty_universe_backoff: parse_var("EMPTY_UNIVERSE_BACKOFF_SECS", 60)?,
            max_concurrent_fetches: parse_var("MAX_CONCURRENT_FETCHES", 30)?,
            request_timeout: parse_var("REQUEST_TIMEOUT_SECS", 10)?,
            rsi_period: parse_var("RSI_PERIOD", 14)?,
            bb_period: parse_var("BB_PERIOD", 20)?,
            bb_std_dev: parse_var("BB_STD_DEV", 2.0)?,
            macd_fast: parse_var("MACD_FAST", 12)?,
            macd_slow: parse_var("MACD_SLOW", 26)?,
            macd_signal: parse_var("MACD_SIGNAL", 9)?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject combinations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_fetches == 0 {
            bail!("MAX_CONCURRENT_FETCHES must be at least 1");
        }
        if self.scan_interval == 0 {
            bail!("SCAN_INTERVAL_SECS must be at least 1");
        }
        if self.rsi_period == 0 || self.bb_period == 0 || self.macd_signal == 0 {
            bail!("indicator periods must be at least 1");
        }
        if self.macd_fast == 0 || self.macd_fast >= self.macd_slow {
            bail!(
                "MACD_FAST ({}) must be positive and below MACD_SLOW ({})",
                self.macd_fast,
                self.macd_slow
            );
        }
        if !self.bb_std_dev.is_finite() || self.bb_std_dev <= 0.0 {
            bail!("BB_STD_DEV must be a positive number");
        }
        let required = IndicatorEngine::new(self.indicator_params()).required_bars();
        if self.kline_limit < required || self.kline_limit > MAX_KLINE_LIMIT {
            bail!(
                "KLINE_LIMIT ({}) must be between {} and {} for these indicator periods",
                self.kline_limit,
                required,
                MAX_KLINE_LIMIT
            );
        }
        Ok(())
    }

    pub fn indicator_params(&self) -> IndicatorParams {
        IndicatorParams {
            rsi_period: self.rsi_period,
            bb_period: self.bb_period,
            bb_std_dev: self.bb_std_dev,
            macd_fast: self.macd_fast,
            macd_slow: self.macd_slow,
            macd_signal: self.macd_signal,
        }
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval)
    }

    pub fn empty_universe_backoff(&self) -> Duration {
        Duration::from_secs(self.empty_universe_backoff)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number", name)),
        Err(_) => Ok(default),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "https://fapi.binance.com".to_string(),
            quote_asset: "USDT".to_string(),
            kline_interval: "12h".to_string(),
            kline_limit: 200,
            scan_interval: 900,
            empty_universe_backoff: 60,
            max_concurrent_fetches: 30,
            request_timeout: 10,
            rsi_period: 14,
            bb_period: 20,
            bb_std_dev: 2.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bind_addr: "0.0.0.0:5000".to_string(),
        }
    }
}
