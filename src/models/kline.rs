use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ScanError, ScanResult};

/// One candlestick as returned by the klines endpoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Open time (ms since epoch)
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Close time (ms since epoch)
    pub close_time: i64,
}

impl PriceBar {
    /// Parse a positional kline row:
    /// `[openTime, "open", "high", "low", "close", "volume", closeTime, ...]`
    pub fn from_row(row: &[Value]) -> ScanResult<Self> {
        if row.len() < 7 {
            return Err(ScanError::MalformedPayload(format!(
                "kline row has {} fields, expected at least 7",
                row.len()
            )));
        }

        Ok(Self {
            open_time: int_field(&row[0], "open_time")?,
            open: decimal_field(&row[1], "open")?,
            high: decimal_field(&row[2], "high")?,
            low: decimal_field(&row[3], "low")?,
            close: decimal_field(&row[4], "close")?,
            volume: decimal_field(&row[5], "volume")?,
            close_time: int_field(&row[6], "close_time")?,
        })
    }
}

fn int_field(value: &Value, name: &str) -> ScanResult<i64> {
    value
        .as_i64()
        .ok_or_else(|| ScanError::MalformedPayload(format!("{} is not an integer: {}", name, value)))
}

/// Prices come as decimal strings; plain numbers are accepted too
fn decimal_field(value: &Value, name: &str) -> ScanResult<f64> {
    let parsed = match value {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(ScanError::MalformedPayload(format!(
            "{} is not a decimal: {}",
            name, value
        ))),
    }
}

/// Ordered candlesticks for one symbol, oldest first
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceHistory {
    pub symbol: String,
    pub bars: Vec<PriceBar>,
}

impl PriceHistory {
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_kline_row() {
        let row = json!([
            1700000000000i64,
            "37000.10",
            "37500.00",
            "36800.5",
            "37210.2",
            "1234.567",
            1700043199999i64,
            "45900000.1",
            1500,
            "600.1",
            "22000000.0",
            "0"
        ]);
        let bar = PriceBar::from_row(row.as_array().unwrap()).unwrap();

        assert_eq!(bar.open_time, 1700000000000);
        assert_eq!(bar.close_time, 1700043199999);
        assert!((bar.close - 37210.2).abs() < 1e-9);
        assert!((bar.volume - 1234.567).abs() < 1e-9);
    }

    #[test]
    fn test_short_row_is_malformed() {
        let row = json!([1700000000000i64, "1.0", "1.0"]);
        let err = PriceBar::from_row(row.as_array().unwrap()).unwrap_err();
        assert!(matches!(err, ScanError::MalformedPayload(_)));
    }

    #[test]
    fn test_non_numeric_close_is_malformed() {
        let row = json!([1i64, "1.0", "1.0", "1.0", "abc", "1.0", 2i64]);
        let err = PriceBar::from_row(row.as_array().unwrap()).unwrap_err();
        assert!(matches!(err, ScanError::MalformedPayload(_)));
    }
}
