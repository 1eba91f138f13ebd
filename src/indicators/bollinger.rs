use std::collections::VecDeque;

/// Bollinger Bands: rolling SMA ± k × population std dev.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    period: usize,
    num_std: f64,
    window: VecDeque<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandPoint {
    pub lower: f64,
    pub middle: f64,
    pub upper: f64,
}

impl BollingerBands {
    pub fn new(period: usize, num_std: f64) -> Self {
        Self {
            period,
            num_std,
            window: VecDeque::with_capacity(period),
        }
    }

    pub fn update(&mut self, close: f64) -> Option<BandPoint> {
        if self.window.len() == self.period {
            self.window.pop_front();
        }
        self.window.push_back(close);
        if self.window.len() < self.period {
            return None;
        }

        let n = self.period as f64;
        let middle = self.window.iter().sum::<f64>() / n;
        let variance = self
            .window
            .iter()
            .map(|x| (x - middle).powi(2))
            .sum::<f64>()
            / n;
        let width = self.num_std * variance.max(0.0).sqrt();

        Some(BandPoint {
            lower: middle - width,
            middle,
            upper: middle + width,
        })
    }
}
