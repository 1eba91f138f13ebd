/// Value reported when there was no price movement at all
pub const NEUTRAL_RSI: f64 = 50.0;

/// RSI (Relative Strength Index) with Wilder smoothing of avg gain/loss.
///
/// The first `period` close-to-close changes are averaged to seed the
/// smoothing, so the first value appears on bar index `period`.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    prev_close: Option<f64>,
    changes: usize,
    gain_sum: f64,
    loss_sum: f64,
    avg_gain: f64,
    avg_loss: f64,
    warm: bool,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            prev_close: None,
            changes: 0,
            gain_sum: 0.0,
            loss_sum: 0.0,
            avg_gain: 0.0,
            avg_loss: 0.0,
            warm: false,
        }
    }

    pub fn update(&mut self, close: f64) -> Option<f64> {
        let prev = match self.prev_close.replace(close) {
            Some(prev) => prev,
            None => return None,
        };

        let change = close - prev;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if self.warm {
            let p = self.period as f64;
            self.avg_gain = (self.avg_gain * (p - 1.0) + gain) / p;
            self.avg_loss = (self.avg_loss * (p - 1.0) + loss) / p;
        } else {
            self.gain_sum += gain;
            self.loss_sum += loss;
            self.changes += 1;
            if self.changes < self.period {
                return None;
            }
            self.avg_gain = self.gain_sum / self.period as f64;
            self.avg_loss = self.loss_sum / self.period as f64;
            self.warm = true;
        }

        Some(self.value())
    }

    fn value(&self) -> f64 {
        if self.avg_loss == 0.0 {
            if self.avg_gain == 0.0 {
                return NEUTRAL_RSI;
            }
            return 100.0;
        }
        let rs = self.avg_gain / self.avg_loss;
        (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
    }
}
