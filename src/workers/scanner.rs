use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::api::MarketDataSource;
use crate::error::{ScanError, ScanResult};
use crate::indicators::IndicatorEngine;
use crate::models::{SymbolRecord, TickerMap};
use crate::signals;
use crate::store::{Snapshot, SnapshotStore};

/// Knobs for one scan cycle
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Candlesticks requested per symbol
    pub kline_limit: usize,
    /// Ceiling on in-flight per-symbol tasks
    pub max_concurrent: usize,
    /// Upper bound on a single history fetch
    pub request_timeout: Duration,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            kline_limit: 200,
            max_concurrent: 30,
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Where a scan cycle currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Discovering,
    FetchingTickers,
    Dispatching,
    Collecting,
    Publishing,
    Idle,
}

impl std::fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CyclePhase::Discovering => "discovering",
            CyclePhase::FetchingTickers => "fetching_tickers",
            CyclePhase::Dispatching => "dispatching",
            CyclePhase::Collecting => "collecting",
            CyclePhase::Publishing => "publishing",
            CyclePhase::Idle => "idle",
        };
        f.write_str(name)
    }
}

/// A symbol left out of this cycle's snapshot, and why
#[derive(Debug)]
pub struct Omission {
    pub symbol: String,
    pub reason: ScanError,
}

/// Result of one per-symbol task
#[derive(Debug)]
pub enum SymbolOutcome {
    Computed(SymbolRecord),
    Omitted(Omission),
}

impl SymbolOutcome {
    fn omitted(symbol: String, reason: ScanError) -> Self {
        SymbolOutcome::Omitted(Omission { symbol, reason })
    }
}

/// What a completed cycle did
#[derive(Debug)]
pub struct CycleReport {
    pub sequence: u64,
    pub universe: usize,
    pub published: usize,
    pub omitted: Vec<Omission>,
    /// Tasks that panicked instead of returning an outcome
    pub panicked: usize,
    pub elapsed: Duration,
}

impl CycleReport {
    /// Omission counts grouped by error kind
    pub fn omitted_by_kind(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for omission in &self.omitted {
            *counts.entry(omission.reason.kind()).or_insert(0) += 1;
        }
        counts
    }
}

/// Fetch → compute → derive for a single symbol; cloned into every task
#[derive(Clone)]
struct SymbolWorker {
    source: Arc<dyn MarketDataSource>,
    engine: Arc<IndicatorEngine>,
    tickers: Arc<TickerMap>,
    kline_limit: usize,
    request_timeout: Duration,
}

impl SymbolWorker {
    async fn process(&self, symbol: String) -> SymbolOutcome {
        let fetch = self.source.price_history(&symbol, self.kline_limit);
        let history = match time::timeout(self.request_timeout, fetch).await {
            Ok(Ok(history)) => history,
            Ok(Err(e)) => return SymbolOutcome::omitted(symbol, e),
            Err(_) => {
                let reason =
                    ScanError::Transport(format!("timed out after {:?}", self.request_timeout));
                return SymbolOutcome::omitted(symbol, reason);
            }
        };

        let indicators = match self.engine.compute(&history) {
            Ok(indicators) => indicators,
            Err(e) => return SymbolOutcome::omitted(symbol, e),
        };

        let close = match history.last_close() {
            Some(close) => close,
            None => {
                let reason = ScanError::InsufficientHistory {
                    required: self.engine.required_bars(),
                    actual: 0,
                };
                return SymbolOutcome::omitted(symbol, reason);
            }
        };

        let record = signals::build_record(&symbol, &indicators, close, self.tickers.get(&symbol));
        SymbolOutcome::Computed(record)
    }
}

/// Runs full scan cycles and publishes each result as a new snapshot
pub struct MarketScanner {
    source: Arc<dyn MarketDataSource>,
    engine: Arc<IndicatorEngine>,
    store: Arc<SnapshotStore>,
    settings: ScanSettings,
    sequence: AtomicU64,
}

impl MarketScanner {
    /// Create a new market scanner
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        engine: IndicatorEngine,
        store: Arc<SnapshotStore>,
        settings: ScanSettings,
    ) -> Self {
        Self {
            source,
            engine: Arc::new(engine),
            store,
            settings,
            sequence: AtomicU64::new(0),
        }
    }

    /// Perform a single scan cycle.
    ///
    /// Only `EmptyUniverse` is returned as an error; every per-symbol failure
    /// ends up in the report's omissions.
    pub async fn run_cycle(&self) -> ScanResult<CycleReport> {
        let started = Instant::now();

        debug!("Cycle phase: {}", CyclePhase::Discovering);
        let symbols = self.source.tradable_symbols().await;
        if symbols.is_empty() {
            warn!("Symbol discovery returned nothing, skipping cycle");
            return Err(ScanError::EmptyUniverse);
        }
        let universe = symbols.len();

        debug!("Cycle phase: {}", CyclePhase::FetchingTickers);
        let tickers = Arc::new(self.source.ticker_stats().await);
        debug!("Loaded 24h stats for {} symbols", tickers.len());

        debug!("Cycle phase: {}", CyclePhase::Dispatching);
        info!(
            "Scanning {} symbols with up to {} concurrent tasks",
            universe, self.settings.max_concurrent
        );

        let worker = SymbolWorker {
            source: Arc::clone(&self.source),
            engine: Arc::clone(&self.engine),
            tickers,
            kline_limit: self.settings.kline_limit,
            request_timeout: self.settings.request_timeout,
        };
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent.max(1)));
        let mut tasks = JoinSet::new();

        for symbol in symbols {
            let worker = worker.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                worker.process(symbol).await
            });
        }

        debug!("Cycle phase: {}", CyclePhase::Collecting);
        let mut records = Vec::with_capacity(universe);
        let mut omitted = Vec::new();
        let mut panicked = 0;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(SymbolOutcome::Computed(record)) => records.push(record),
                Ok(SymbolOutcome::Omitted(omission)) => {
                    debug!("Omitting {}: {}", omission.symbol, omission.reason);
                    omitted.push(omission);
                }
                Err(e) => {
                    error!("Symbol task failed: {}", e);
                    panicked += 1;
                }
            }
        }

        debug!("Cycle phase: {}", CyclePhase::Publishing);
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let published = records.len();
        self.store.publish(Snapshot::new(sequence, records));

        let report = CycleReport {
            sequence,
            universe,
            published,
            omitted,
            panicked,
            elapsed: started.elapsed(),
        };

        info!(
            "Scan #{} complete: {}/{} symbols published, omitted {:?} in {:.1}s",
            report.sequence,
            report.published,
            report.universe,
            report.omitted_by_kind(),
            report.elapsed.as_secs_f64()
        );

        Ok(report)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::{BTreeSet, HashMap};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::indicators::tests::synthetic_history;
    use crate::models::{PriceHistory, TickerStats};

    /// How the fake upstream answers a history request
    #[derive(Debug, Clone, Copy)]
    pub(crate) enum FakeHistory {
        Bars(usize),
        Reject(u16),
        Hang,
    }

    #[derive(Default)]
    pub(crate) struct FakeSource {
        pub symbols: Mutex<BTreeSet<String>>,
        pub tickers: TickerMap,
        pub histories: HashMap<String, FakeHistory>,
        pub fetch_delay: Duration,
        pub discoveries: AtomicUsize,
        in_flight: AtomicUsize,
        pub max_in_flight: AtomicUsize,
    }

    impl FakeSource {
        pub(crate) fn with(histories: &[(&str, FakeHistory)]) -> Self {
            Self {
                symbols: Mutex::new(histories.iter().map(|(s, _)| s.to_string()).collect()),
                histories: histories
                    .iter()
                    .map(|(s, h)| (s.to_string(), *h))
                    .collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl MarketDataSource for FakeSource {
        async fn tradable_symbols(&self) -> BTreeSet<String> {
            self.discoveries.fetch_add(1, Ordering::SeqCst);
            self.symbols.lock().unwrap().clone()
        }

        async fn ticker_stats(&self) -> TickerMap {
            self.tickers.clone()
        }

        async fn price_history(&self, symbol: &str, _limit: usize) -> ScanResult<PriceHistory> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.fetch_delay.is_zero() {
                time::sleep(self.fetch_delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match self.histories.get(symbol).copied() {
                Some(FakeHistory::Bars(n)) => Ok(synthetic_history(symbol, n)),
                Some(FakeHistory::Reject(status)) => Err(ScanError::UpstreamRejected {
                    status,
                    body: "{\"code\":-1121,\"msg\":\"Invalid symbol.\"}".to_string(),
                }),
                Some(FakeHistory::Hang) => {
                    time::sleep(Duration::from_secs(30)).await;
                    Ok(synthetic_history(symbol, 200))
                }
                None => Err(ScanError::Transport("connection refused".to_string())),
            }
        }
    }

    pub(crate) fn scanner(source: Arc<FakeSource>, store: Arc<SnapshotStore>) -> MarketScanner {
        MarketScanner::new(
            source,
            IndicatorEngine::default(),
            store,
            ScanSettings {
                kline_limit: 200,
                max_concurrent: 4,
                request_timeout: Duration::from_millis(200),
            },
        )
    }

    #[tokio::test]
    async fn test_failed_symbol_is_omitted_from_snapshot() {
        let source = Arc::new(FakeSource::with(&[
            ("BTCUSDT", FakeHistory::Reject(400)),
            ("ETHUSDT", FakeHistory::Bars(200)),
        ]));
        let store = Arc::new(SnapshotStore::new());

        let report = scanner(source, Arc::clone(&store)).run_cycle().await.unwrap();

        let snapshot = store.get();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.get("ETHUSDT").is_some());
        assert!(snapshot.get("BTCUSDT").is_none());

        assert_eq!(report.universe, 2);
        assert_eq!(report.published, 1);
        assert_eq!(report.omitted.len(), 1);
        assert_eq!(report.omitted[0].symbol, "BTCUSDT");
        assert_eq!(report.omitted[0].reason.kind(), "upstream_rejected");
    }

    #[tokio::test]
    async fn test_short_history_is_omitted() {
        let source = Arc::new(FakeSource::with(&[
            ("NEWUSDT", FakeHistory::Bars(20)),
            ("ETHUSDT", FakeHistory::Bars(200)),
        ]));
        let store = Arc::new(SnapshotStore::new());

        let report = scanner(source, Arc::clone(&store)).run_cycle().await.unwrap();

        assert!(store.get().get("NEWUSDT").is_none());
        assert_eq!(report.omitted_by_kind().get("insufficient_history"), Some(&1));
    }

    #[tokio::test]
    async fn test_empty_universe_keeps_previous_snapshot() {
        let source = Arc::new(FakeSource::with(&[("ETHUSDT", FakeHistory::Bars(200))]));
        let store = Arc::new(SnapshotStore::new());
        let scanner = scanner(Arc::clone(&source), Arc::clone(&store));

        scanner.run_cycle().await.unwrap();
        let before = store.get();
        assert_eq!(before.len(), 1);

        source.symbols.lock().unwrap().clear();
        let err = scanner.run_cycle().await.unwrap_err();
        assert!(matches!(err, ScanError::EmptyUniverse));

        let after = store.get();
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[tokio::test]
    async fn test_missing_tickers_read_as_zero() {
        let source = Arc::new(FakeSource::with(&[
            ("BTCUSDT", FakeHistory::Bars(200)),
            ("ETHUSDT", FakeHistory::Bars(200)),
        ]));
        let store = Arc::new(SnapshotStore::new());

        scanner(source, Arc::clone(&store)).run_cycle().await.unwrap();

        let snapshot = store.get();
        assert_eq!(snapshot.len(), 2);
        for record in snapshot.records() {
            assert_eq!(record.change, "0.00%");
            assert_eq!(record.quote_volume, "0M");
        }
    }

    #[tokio::test]
    async fn test_ticker_stats_flow_into_records() {
        let mut source = FakeSource::with(&[("ETHUSDT", FakeHistory::Bars(200))]);
        source.tickers.insert(
            "ETHUSDT".to_string(),
            TickerStats {
                symbol: "ETHUSDT".to_string(),
                price_change_percent: 4.567,
                quote_volume: 9_876_543_210.0,
            },
        );
        let store = Arc::new(SnapshotStore::new());

        scanner(Arc::new(source), Arc::clone(&store)).run_cycle().await.unwrap();

        let snapshot = store.get();
        let record = snapshot.get("ETHUSDT").unwrap();
        assert_eq!(record.change, "4.57%");
        assert_eq!(record.quote_volume, "9,876M");
    }

    #[tokio::test]
    async fn test_concurrency_stays_under_ceiling() {
        let histories: Vec<(String, FakeHistory)> = (0..40)
            .map(|i| (format!("SYM{}USDT", i), FakeHistory::Bars(60)))
            .collect();
        let refs: Vec<(&str, FakeHistory)> =
            histories.iter().map(|(s, h)| (s.as_str(), *h)).collect();
        let mut source = FakeSource::with(&refs);
        source.fetch_delay = Duration::from_millis(10);
        let source = Arc::new(source);
        let store = Arc::new(SnapshotStore::new());

        let report = scanner(Arc::clone(&source), Arc::clone(&store))
            .run_cycle()
            .await
            .unwrap();

        assert_eq!(report.published, 40);
        let peak = source.max_in_flight.load(Ordering::SeqCst);
        assert!(peak >= 1 && peak <= 4, "peak in-flight was {}", peak);
    }

    #[tokio::test]
    async fn test_slow_symbol_times_out_without_blocking_others() {
        let source = Arc::new(FakeSource::with(&[
            ("SLOWUSDT", FakeHistory::Hang),
            ("ETHUSDT", FakeHistory::Bars(200)),
            ("BTCUSDT", FakeHistory::Bars(200)),
        ]));
        let store = Arc::new(SnapshotStore::new());

        let report = scanner(source, Arc::clone(&store)).run_cycle().await.unwrap();

        assert_eq!(report.published, 2);
        assert_eq!(report.omitted.len(), 1);
        assert_eq!(report.omitted[0].symbol, "SLOWUSDT");
        assert_eq!(report.omitted[0].reason.kind(), "transport");
        assert!(report.elapsed < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_each_cycle_publishes_newer_snapshot() {
        let source = Arc::new(FakeSource::with(&[("ETHUSDT", FakeHistory::Bars(200))]));
        let store = Arc::new(SnapshotStore::new());
        let scanner = scanner(source, Arc::clone(&store));

        let first = scanner.run_cycle().await.unwrap();
        let second = scanner.run_cycle().await.unwrap();

        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!(store.get().sequence, 2);
    }

    #[tokio::test]
    async fn test_all_symbols_failing_publishes_empty_snapshot() {
        let source = Arc::new(FakeSource::with(&[
            ("BTCUSDT", FakeHistory::Reject(418)),
            ("ETHUSDT", FakeHistory::Reject(429)),
        ]));
        let store = Arc::new(SnapshotStore::new());

        let report = scanner(source, Arc::clone(&store)).run_cycle().await.unwrap();

        assert_eq!(report.published, 0);
        assert_eq!(store.get().sequence, 1);
        assert!(store.get().is_empty());
    }
}
