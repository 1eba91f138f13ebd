pub mod binance;
pub mod source;

pub use binance::BinanceFuturesClient;
pub use source::MarketDataSource;
