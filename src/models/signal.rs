use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A discrete trading signal derived from indicator values
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    /// RSI below the oversold threshold
    RsiOversold,
    /// RSI above the overbought threshold
    RsiOverbought,
    /// Close below the lower Bollinger band
    BbBreakLower,
    /// Close above the upper Bollinger band
    BbBreakUpper,
    /// MACD line crossed above its signal line (golden cross)
    MacdBullCross,
    /// MACD line crossed below its signal line (death cross)
    MacdBearCross,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::RsiOversold => "RSI_OVERSOLD",
            Signal::RsiOverbought => "RSI_OVERBOUGHT",
            Signal::BbBreakLower => "BB_BREAK_LOWER",
            Signal::BbBreakUpper => "BB_BREAK_UPPER",
            Signal::MacdBullCross => "MACD_BULL_CROSS",
            Signal::MacdBearCross => "MACD_BEAR_CROSS",
        }
    }

    /// Human-readable label for dashboards
    pub fn label(&self) -> &'static str {
        match self {
            Signal::RsiOversold => "RSI oversold",
            Signal::RsiOverbought => "RSI overbought",
            Signal::BbBreakLower => "Broke lower Bollinger band",
            Signal::BbBreakUpper => "Broke upper Bollinger band",
            Signal::MacdBullCross => "MACD golden cross",
            Signal::MacdBearCross => "MACD death cross",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signals fired for one symbol in one cycle; may be empty
pub type SignalSet = BTreeSet<Signal>;
