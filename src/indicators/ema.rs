/// Exponential Moving Average seeded with a simple average.
///
/// Behaviour:
///   bars 0..N-1 → undefined, inputs are summed
///   bar  N-1    → value = mean of the first N inputs
///   bar  N+     → value = α·price + (1−α)·prev   where α = 2/(N+1)
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    alpha: f64,
    seed_sum: f64,
    count: usize,
    value: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
            seed_sum: 0.0,
            count: 0,
            value: None,
        }
    }

    /// Feed one input, return the EMA once it is seeded.
    pub fn update(&mut self, price: f64) -> Option<f64> {
        self.count += 1;
        match self.value {
            Some(prev) => {
                self.value = Some(self.alpha * price + (1.0 - self.alpha) * prev);
            }
            None => {
                self.seed_sum += price;
                if self.count >= self.period {
                    self.value = Some(self.seed_sum / self.period as f64);
                }
            }
        }
        self.value
    }
}
