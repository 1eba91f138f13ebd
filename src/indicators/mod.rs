//! Pure indicator computation over a symbol's closing prices.
//!
//! Every indicator is an incremental state machine fed one close at a time;
//! [`IndicatorEngine`] runs them side by side and keeps only what signal
//! derivation needs: the fully-defined values of the last two bars.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;

use crate::error::{ScanError, ScanResult};
use crate::models::PriceHistory;

pub use bollinger::{BandPoint, BollingerBands};
pub use ema::Ema;
pub use macd::{Macd, MacdPoint};
pub use rsi::{Rsi, NEUTRAL_RSI};

/// Lookback periods for all indicators
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub bb_period: usize,
    pub bb_std_dev: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            bb_period: 20,
            bb_std_dev: 2.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
        }
    }
}

/// All indicator values for one bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPoint {
    pub rsi: f64,
    pub bb_lower: f64,
    pub bb_middle: f64,
    pub bb_upper: f64,
    pub macd: f64,
    pub macd_signal: f64,
}

/// Values for the last two bars of a history
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSet {
    pub previous: IndicatorPoint,
    pub latest: IndicatorPoint,
}

/// Running state of every indicator for one series
#[derive(Debug, Clone)]
struct IndicatorState {
    rsi: Rsi,
    bands: BollingerBands,
    macd: Macd,
}

impl IndicatorState {
    fn new(params: &IndicatorParams) -> Self {
        Self {
            rsi: Rsi::new(params.rsi_period),
            bands: BollingerBands::new(params.bb_period, params.bb_std_dev),
            macd: Macd::new(params.macd_fast, params.macd_slow, params.macd_signal),
        }
    }

    /// All three indicators are always fed, even while others are warming up.
    fn update(&mut self, close: f64) -> Option<IndicatorPoint> {
        let rsi = self.rsi.update(close);
        let band = self.bands.update(close);
        let macd = self.macd.update(close);

        match (rsi, band, macd) {
            (Some(rsi), Some(band), Some(macd)) => Some(IndicatorPoint {
                rsi,
                bb_lower: band.lower,
                bb_middle: band.middle,
                bb_upper: band.upper,
                macd: macd.macd,
                macd_signal: macd.signal,
            }),
            _ => None,
        }
    }
}

/// Computes indicator values from a price history. Stateless between calls.
#[derive(Debug, Clone, Default)]
pub struct IndicatorEngine {
    params: IndicatorParams,
}

impl IndicatorEngine {
    pub fn new(params: IndicatorParams) -> Self {
        Self { params }
    }

    /// Longest single lookback; shorter histories can never be scored
    pub fn longest_lookback(&self) -> usize {
        let p = &self.params;
        (p.rsi_period + 1).max(p.bb_period).max(p.macd_slow)
    }

    /// Bars needed so the last two bars carry every indicator
    pub fn required_bars(&self) -> usize {
        let p = &self.params;
        (p.rsi_period + 2)
            .max(p.bb_period + 1)
            .max(p.macd_slow + p.macd_signal)
            .max(self.longest_lookback())
    }

    /// Per-bar values for a close series; `None` while any indicator warms up
    pub fn series(&self, closes: &[f64]) -> Vec<Option<IndicatorPoint>> {
        let mut state = IndicatorState::new(&self.params);
        closes.iter().map(|&close| state.update(close)).collect()
    }

    /// Indicator values for the last two bars of `history`
    pub fn compute(&self, history: &PriceHistory) -> ScanResult<IndicatorSet> {
        let required = self.required_bars();
        let actual = history.len();
        if actual < required {
            return Err(ScanError::InsufficientHistory { required, actual });
        }

        let mut state = IndicatorState::new(&self.params);
        let mut previous = None;
        let mut latest = None;
        for bar in &history.bars {
            previous = latest;
            latest = state.update(bar.close);
        }

        match (previous, latest) {
            (Some(previous), Some(latest)) => Ok(IndicatorSet { previous, latest }),
            _ => Err(ScanError::InsufficientHistory { required, actual }),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::PriceBar;

    /// Deterministic wavy price path with a mild drift
    pub(crate) fn synthetic_history(symbol: &str, len: usize) -> PriceHistory {
        let bars = (0..len)
            .map(|i| {
                let t = i as f64;
                let close = 100.0 + 10.0 * (t / 5.0).sin() + t * 0.1;
                PriceBar {
                    open_time: i as i64 * 43_200_000,
                    open: close - 0.5,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1_000.0 + t,
                    close_time: (i as i64 + 1) * 43_200_000 - 1,
                }
            })
            .collect();
        PriceHistory::new(symbol, bars)
    }

    #[test]
    fn test_default_lookbacks() {
        let engine = IndicatorEngine::default();
        assert_eq!(engine.longest_lookback(), 26);
        assert_eq!(engine.required_bars(), 35);
    }

    #[test]
    fn test_short_history_is_insufficient() {
        let engine = IndicatorEngine::default();
        for len in [0, 1, 2, 25] {
            let err = engine.compute(&synthetic_history("X", len)).unwrap_err();
            assert!(
                matches!(err, ScanError::InsufficientHistory { actual, .. } if actual == len),
                "len {} gave {:?}",
                len,
                err
            );
        }
    }

    #[test]
    fn test_history_without_two_signal_bars_is_insufficient() {
        let engine = IndicatorEngine::default();
        assert!(engine.compute(&synthetic_history("X", 34)).is_err());
        assert!(engine.compute(&synthetic_history("X", 35)).is_ok());
    }

    #[test]
    fn test_compute_is_deterministic() {
        let engine = IndicatorEngine::default();
        let history = synthetic_history("ETHUSDT", 200);
        let first = engine.compute(&history).unwrap();
        for _ in 0..5 {
            let again = engine.compute(&history).unwrap();
            assert_eq!(first, again);
            assert_eq!(first.latest.rsi.to_bits(), again.latest.rsi.to_bits());
            assert_eq!(first.latest.macd.to_bits(), again.latest.macd.to_bits());
        }
    }

    #[test]
    fn test_compute_matches_last_two_series_points() {
        let engine = IndicatorEngine::default();
        let history = synthetic_history("ETHUSDT", 120);
        let set = engine.compute(&history).unwrap();
        let series = engine.series(&history.closes());

        assert_eq!(series[118], Some(set.previous));
        assert_eq!(series[119], Some(set.latest));
    }

    #[test]
    fn test_values_are_finite_and_bounded() {
        let engine = IndicatorEngine::default();
        let set = engine.compute(&synthetic_history("ETHUSDT", 200)).unwrap();
        for point in [set.previous, set.latest] {
            assert!((0.0..=100.0).contains(&point.rsi));
            assert!(point.bb_lower <= point.bb_middle && point.bb_middle <= point.bb_upper);
            assert!(point.macd.is_finite() && point.macd_signal.is_finite());
        }
    }

    #[test]
    fn test_flat_history_gives_neutral_rsi() {
        let engine = IndicatorEngine::default();
        let mut history = synthetic_history("FLAT", 60);
        for bar in &mut history.bars {
            bar.close = 1.25;
        }
        let set = engine.compute(&history).unwrap();
        assert_eq!(set.latest.rsi, NEUTRAL_RSI);
        assert_eq!(set.latest.bb_lower, set.latest.bb_upper);
    }
}
