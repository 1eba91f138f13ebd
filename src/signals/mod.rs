pub mod format;

use chrono::{Local, Utc};

use crate::indicators::{IndicatorPoint, IndicatorSet};
use crate::models::{Signal, SignalSet, SymbolRecord, TickerStats};

pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;

/// Evaluate every signal rule against the last two bars.
///
/// Crossovers need strict inequality on both bars; a tie on either bar means
/// no cross.
pub fn derive(latest: &IndicatorPoint, previous: &IndicatorPoint, close: f64) -> SignalSet {
    let mut signals = SignalSet::new();

    if latest.rsi < RSI_OVERSOLD {
        signals.insert(Signal::RsiOversold);
    }
    if latest.rsi > RSI_OVERBOUGHT {
        signals.insert(Signal::RsiOverbought);
    }

    if close < latest.bb_lower {
        signals.insert(Signal::BbBreakLower);
    }
    if close > latest.bb_upper {
        signals.insert(Signal::BbBreakUpper);
    }

    if previous.macd < previous.macd_signal && latest.macd > latest.macd_signal {
        signals.insert(Signal::MacdBullCross);
    }
    if previous.macd > previous.macd_signal && latest.macd < latest.macd_signal {
        signals.insert(Signal::MacdBearCross);
    }

    signals
}

/// Build the published record for one symbol.
///
/// Missing 24h stats are shown as zero change and zero volume.
pub fn build_record(
    symbol: &str,
    indicators: &IndicatorSet,
    close: f64,
    ticker: Option<&TickerStats>,
) -> SymbolRecord {
    let latest = &indicators.latest;
    let signals = derive(latest, &indicators.previous, close);

    let (change, quote_volume) = ticker
        .map(|t| (t.price_change_percent, t.quote_volume))
        .unwrap_or((0.0, 0.0));

    SymbolRecord {
        symbol: symbol.to_string(),
        price: format!("{:.4}", close),
        change: format::percent(change),
        quote_volume: format::millions(quote_volume),
        rsi: format!("{:.2}", latest.rsi),
        bbl: format!("{:.2}", latest.bb_lower),
        bbu: format!("{:.2}", latest.bb_upper),
        macd: format!("{:.2}", latest.macd),
        macds: format!("{:.2}", latest.macd_signal),
        signals,
        timestamp: Local::now().format("%H:%M:%S").to_string(),
        computed_at: Utc::now(),
    }
}
