use super::ema::Ema;

/// MACD line = EMA(fast) − EMA(slow); signal line = EMA(signal) of the MACD line.
#[derive(Debug, Clone)]
pub struct Macd {
    ema_fast: Ema,
    ema_slow: Ema,
    ema_signal: Ema,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    pub macd: f64,
    pub signal: f64,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self {
            ema_fast: Ema::new(fast),
            ema_slow: Ema::new(slow),
            ema_signal: Ema::new(signal),
        }
    }

    /// Feed one close; returns both lines once the signal EMA is seeded.
    pub fn update(&mut self, close: f64) -> Option<MacdPoint> {
        let fast = self.ema_fast.update(close);
        let slow = self.ema_slow.update(close);

        let macd = match (fast, slow) {
            (Some(f), Some(s)) => f - s,
            _ => return None,
        };

        self.ema_signal
            .update(macd)
            .map(|signal| MacdPoint { macd, signal })
    }
}
