use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SignalSet;

/// Display-ready scan result for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolRecord {
    pub symbol: String,

    /// Last close, 4 decimals
    pub price: String,

    /// 24h change, e.g. "-3.41%"
    pub change: String,

    /// 24h quote volume in millions, e.g. "1,234M"
    pub quote_volume: String,

    pub rsi: String,
    pub bbl: String,
    pub bbu: String,
    pub macd: String,
    pub macds: String,

    pub signals: SignalSet,

    /// Wall-clock time of computation (HH:MM:SS, local)
    pub timestamp: String,

    pub computed_at: DateTime<Utc>,
}
