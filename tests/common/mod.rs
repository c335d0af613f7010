#![allow(dead_code)]

use async_trait::async_trait;
use coinx::api::{ExchangeCatalog, MarketDataSource};
use coinx::config::RefreshConfig;
use coinx::error::{AppError, Result};
use coinx::models::{
    FundingRate, Instrument, IntervalSample, KlineVolume, OpenInterestSample, Ticker24h,
};
use coinx::refresh::{RefreshService, SymbolAggregator};
use coinx::storage::{MemoryMarkerStore, MemorySnapshotStore, SymbolRegistry};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Deterministic market: every symbol has OI 100 @ 50, history OI 80 @ 40.
#[derive(Default)]
pub struct FakeMarket {
    pub failing: HashSet<String>,
    pub slow: HashSet<String>,
    pub delay: Duration,
    pub anchor_calls: AtomicUsize,
}

impl FakeMarket {
    pub fn failing(symbols: &[&str]) -> Self {
        Self {
            failing: symbols.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn slow(symbols: &[&str], delay: Duration) -> Self {
        Self {
            slow: symbols.iter().map(|s| s.to_string()).collect(),
            delay,
            ..Self::default()
        }
    }

    pub fn anchor_calls(&self) -> usize {
        self.anchor_calls.load(Ordering::SeqCst)
    }
}

pub fn ticker(symbol: &str, pct: f64) -> Ticker24h {
    Ticker24h {
        symbol: symbol.to_string(),
        price_change: pct / 2.0,
        price_change_percent: pct,
        last_price: 50.0,
        high_price: 55.0,
        low_price: 45.0,
        volume: 1000.0,
        quote_volume: Some(50_000.0),
    }
}

#[async_trait]
impl MarketDataSource for FakeMarket {
    async fn current_open_interest(&self, symbol: &str) -> Option<OpenInterestSample> {
        self.anchor_calls.fetch_add(1, Ordering::SeqCst);
        if self.slow.contains(symbol) {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.contains(symbol) {
            return None;
        }
        Some(OpenInterestSample {
            symbol: symbol.to_string(),
            open_interest: 100.0,
            open_interest_value: 5000.0,
            observed_at: 1_700_000_000_000,
        })
    }

    async fn historical_open_interest(
        &self,
        symbol: &str,
        interval: &str,
        _min_points: u32,
    ) -> Option<IntervalSample> {
        Some(IntervalSample {
            interval: interval.to_string(),
            sample: OpenInterestSample {
                symbol: symbol.to_string(),
                open_interest: 80.0,
                open_interest_value: 3200.0,
                observed_at: 1_699_999_000_000,
            },
        })
    }

    async fn ticker_24h(&self, symbol: &str) -> Option<Ticker24h> {
        Some(ticker(symbol, -2.0))
    }

    async fn latest_price(&self, _symbol: &str) -> Option<f64> {
        Some(50.0)
    }

    async fn funding_rate(&self, symbol: &str) -> Option<FundingRate> {
        Some(FundingRate {
            symbol: symbol.to_string(),
            mark_price: 50.0,
            index_price: 50.0,
            estimated_settle_price: None,
            last_funding_rate: 0.0001,
            next_funding_time: 1_700_003_600_000,
            interest_rate: Some(0.0001),
            time: 1_700_000_000_000,
        })
    }

    async fn futures_kline_latest(&self, _symbol: &str, _interval: &str) -> Option<KlineVolume> {
        Some(KlineVolume {
            open_time: Some(0),
            close_time: Some(1),
            quote_volume: 1000.0,
            taker_buy_quote_volume: 600.0,
        })
    }

    async fn aggregate_futures_kline(
        &self,
        _symbol: &str,
        _base_interval: &str,
        _count: u32,
    ) -> Option<KlineVolume> {
        None
    }
}

pub struct FakeCatalog {
    pub instruments: Vec<Instrument>,
    pub tickers: Vec<Ticker24h>,
    pub ticker_calls: AtomicUsize,
    pub fail: bool,
}

impl FakeCatalog {
    pub fn new(symbols: &[&str], tickers: Vec<Ticker24h>) -> Self {
        Self {
            instruments: symbols.iter().map(|s| instrument(s)).collect(),
            tickers,
            ticker_calls: AtomicUsize::new(0),
            fail: false,
        }
    }
}

pub fn instrument(symbol: &str) -> Instrument {
    Instrument {
        symbol: symbol.to_string(),
        contract_type: "PERPETUAL".to_string(),
        status: "TRADING".to_string(),
        base_asset: Some(symbol.trim_end_matches("USDT").to_string()),
        quote_asset: Some("USDT".to_string()),
        margin_asset: Some("USDT".to_string()),
        price_precision: Some(2),
        quantity_precision: Some(3),
        onboard_date: Some(1_569_398_400_000),
    }
}

#[async_trait]
impl ExchangeCatalog for FakeCatalog {
    async fn instruments(&self) -> Result<Vec<Instrument>> {
        if self.fail {
            return Err(AppError::BinanceApi("Status 503: unavailable".to_string()));
        }
        Ok(self.instruments.clone())
    }

    async fn all_tickers(&self) -> Result<Vec<Ticker24h>> {
        self.ticker_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::BinanceApi("Status 503: unavailable".to_string()));
        }
        Ok(self.tickers.clone())
    }
}

pub struct Harness {
    pub service: Arc<RefreshService>,
    pub snapshots: Arc<MemorySnapshotStore>,
    pub markers: Arc<MemoryMarkerStore>,
    pub registry: Arc<SymbolRegistry>,
}

pub fn refresh_config(intervals: &[&str]) -> RefreshConfig {
    RefreshConfig {
        time_intervals: intervals.iter().map(|s| s.to_string()).collect(),
        symbol_concurrency: 2,
        symbol_timeout_secs: 1,
        interval_timeout_secs: 1,
        ..RefreshConfig::default()
    }
}

pub fn harness(source: Arc<dyn MarketDataSource>, config: &RefreshConfig) -> Harness {
    let snapshots = Arc::new(MemorySnapshotStore::new(config.history_retention));
    let markers = Arc::new(MemoryMarkerStore::new());
    let registry = Arc::new(SymbolRegistry::in_memory());
    let aggregator = Arc::new(SymbolAggregator::new(source, config));
    let service = Arc::new(RefreshService::new(
        aggregator,
        Arc::clone(&registry),
        snapshots.clone(),
        markers.clone(),
        config,
    ));
    Harness {
        service,
        snapshots,
        markers,
        registry,
    }
}

pub fn symbols(list: &[&str]) -> Option<Vec<String>> {
    Some(list.iter().map(|s| s.to_string()).collect())
}
