use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// 24h rolling statistics for one symbol
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TickerStats {
    pub symbol: String,

    /// Price change over the last 24h, in percent
    pub price_change_percent: f64,

    /// Traded volume over the last 24h, in quote currency
    pub quote_volume: f64,
}

/// Collection of 24h stats indexed by symbol, shared read-only within a cycle
pub type TickerMap = HashMap<String, TickerStats>;
