use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn};

use super::scanner::{CycleReport, CyclePhase, MarketScanner};
use crate::error::{ScanError, ScanResult};

/// Drives the scanner forever on a fixed start-to-start cadence.
pub struct Scheduler {
    scanner: MarketScanner,
    interval: Duration,
    backoff: Duration,
}

impl Scheduler {
    /// `backoff` is used instead of `interval` after a cycle that found no symbols
    pub fn new(scanner: MarketScanner, interval: Duration, backoff: Duration) -> Self {
        Self {
            scanner,
            interval,
            backoff,
        }
    }

    /// Time from the start of a cycle to the start of the next one
    pub fn delay_after(&self, outcome: &ScanResult<CycleReport>) -> Duration {
        match outcome {
            Ok(_) => self.interval,
            Err(_) => self.backoff,
        }
    }

    /// When the next cycle should start. If this is already in the past the
    /// next cycle starts late, never concurrently.
    pub fn next_start(&self, cycle_start: Instant, outcome: &ScanResult<CycleReport>) -> Instant {
        cycle_start + self.delay_after(outcome)
    }

    /// Run the scheduler loop. The first cycle starts immediately.
    pub async fn run(&self) {
        info!(
            "Scheduler started (interval: {:?}, empty-universe backoff: {:?})",
            self.interval, self.backoff
        );

        loop {
            let started = Instant::now();
            let outcome = self.scanner.run_cycle().await;

            match &outcome {
                Ok(report) if report.panicked > 0 => {
                    warn!("{} symbol tasks failed abnormally this cycle", report.panicked);
                }
                Ok(_) => {}
                Err(ScanError::EmptyUniverse) => {
                    warn!("No tradable symbols, retrying in {:?}", self.backoff);
                }
                Err(e) => {
                    error!("Scan cycle failed: {}", e);
                }
            }

            let next = self.next_start(started, &outcome);
            if next <= Instant::now() {
                warn!(
                    "Scan cycle overran its slot ({:?}), starting next cycle now",
                    started.elapsed()
                );
            }

            debug!("Cycle phase: {}", CyclePhase::Idle);
            time::sleep_until(next).await;
        }
    }
}
