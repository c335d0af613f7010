use super::pool::{BoundedPool, TaskOutcome};
use crate::analysis::net_inflow;
use crate::api::MarketDataSource;
use crate::config::RefreshConfig;
use crate::models::{IntervalSample, SymbolRecord};

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builds one [`SymbolRecord`] from current, historical and derived data.
pub struct SymbolAggregator {
    source: Arc<dyn MarketDataSource>,
    intervals: Vec<String>,
    interval_pool: BoundedPool,
}

impl SymbolAggregator {
    pub fn new(source: Arc<dyn MarketDataSource>, config: &RefreshConfig) -> Self {
        Self {
            source,
            intervals: config.time_intervals.clone(),
            interval_pool: BoundedPool::new(
                "intervals",
                config.interval_concurrency,
                config.interval_timeout(),
            ),
        }
    }

    pub fn source(&self) -> &Arc<dyn MarketDataSource> {
        &self.source
    }

    pub fn intervals(&self) -> &[String] {
        &self.intervals
    }

    /// `None` when the current open interest is unavailable. Everything
    /// else degrades per metric. `captured_at` is the refresh cycle time.
    pub async fn aggregate(&self, symbol: &str, captured_at: DateTime<Utc>) -> Option<SymbolRecord> {
        let Some(mut current) = self.source.current_open_interest(symbol).await else {
            warn!("No current open interest for {}, skipping", symbol);
            return None;
        };

        if current.open_interest_value == 0.0 {
            match self.source.latest_price(symbol).await {
                Some(price) => {
                    current.open_interest_value = current.open_interest * price;
                    debug!(
                        "Backfilled open interest value for {}: {} x {}",
                        symbol, current.open_interest, price
                    );
                }
                None => warn!("No price for {}, open interest value stays 0", symbol),
            }
        }

        let price_change = self.source.ticker_24h(symbol).await;
        let intervals = self.historical(symbol).await;
        let net_inflow = net_inflow(self.source.as_ref(), symbol).await;

        info!(
            "Aggregated {}: {}/{} intervals",
            symbol,
            intervals.len(),
            self.intervals.len()
        );

        Some(SymbolRecord {
            symbol: symbol.to_string(),
            current,
            intervals,
            price_change,
            net_inflow,
            captured_at: captured_at.timestamp_millis(),
        })
    }

    async fn historical(&self, symbol: &str) -> Vec<IntervalSample> {
        let source = Arc::clone(&self.source);
        let owned = symbol.to_string();
        let outcomes = self
            .interval_pool
            .run(self.intervals.clone(), move |interval: String| {
                let source = Arc::clone(&source);
                let symbol = owned.clone();
                async move { source.historical_open_interest(&symbol, &interval, 2).await }
            })
            .await;

        self.intervals
            .iter()
            .zip(outcomes)
            .filter_map(|(interval, outcome)| match outcome {
                TaskOutcome::Succeeded(sample) => Some(sample),
                TaskOutcome::TimedOut => {
                    warn!("Open interest history for {} {} timed out", symbol, interval);
                    None
                }
                TaskOutcome::Failed(_) => {
                    debug!("No open interest history for {} {}", symbol, interval);
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FundingRate, KlineVolume, OpenInterestSample, Ticker24h};
    use async_trait::async_trait;
    use std::time::Duration;

    struct Fake {
        current_value: f64,
        price: Option<f64>,
        slow_interval: Option<&'static str>,
    }

    fn sample(oi: f64, value: f64) -> OpenInterestSample {
        OpenInterestSample {
            symbol: "BTCUSDT".into(),
            open_interest: oi,
            open_interest_value: value,
            observed_at: 1,
        }
    }

    #[async_trait]
    impl MarketDataSource for Fake {
        async fn current_open_interest(&self, symbol: &str) -> Option<OpenInterestSample> {
            (symbol != "GONEUSDT").then(|| sample(10.0, self.current_value))
        }
        async fn historical_open_interest(&self, _: &str, interval: &str, _: u32) -> Option<IntervalSample> {
            if Some(interval) == self.slow_interval {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            (interval != "1d").then(|| IntervalSample {
                interval: interval.into(),
                sample: sample(8.0, 400.0),
            })
        }
        async fn ticker_24h(&self, _: &str) -> Option<Ticker24h> {
            None
        }
        async fn latest_price(&self, _: &str) -> Option<f64> {
            self.price
        }
        async fn funding_rate(&self, _: &str) -> Option<FundingRate> {
            None
        }
        async fn futures_kline_latest(&self, _: &str, _: &str) -> Option<KlineVolume> {
            Some(KlineVolume {
                open_time: None,
                close_time: None,
                quote_volume: 1000.0,
                taker_buy_quote_volume: 600.0,
            })
        }
        async fn aggregate_futures_kline(&self, _: &str, _: &str, _: u32) -> Option<KlineVolume> {
            None
        }
    }

    fn config(intervals: &[&str]) -> RefreshConfig {
        RefreshConfig {
            time_intervals: intervals.iter().map(|s| s.to_string()).collect(),
            interval_timeout_secs: 1,
            ..RefreshConfig::default()
        }
    }

    #[tokio::test]
    async fn test_missing_anchor_drops_symbol() {
        let fake = Fake { current_value: 1.0, price: None, slow_interval: None };
        let aggregator = SymbolAggregator::new(Arc::new(fake), &config(&["1h"]));
        assert!(aggregator.aggregate("GONEUSDT", Utc::now()).await.is_none());
    }

    #[tokio::test]
    async fn test_value_backfilled_from_price() {
        let fake = Fake { current_value: 0.0, price: Some(25.0), slow_interval: None };
        let aggregator = SymbolAggregator::new(Arc::new(fake), &config(&["1h"]));
        let record = aggregator.aggregate("BTCUSDT", Utc::now()).await.unwrap();
        assert_eq!(record.current.open_interest_value, 250.0);
    }

    #[tokio::test]
    async fn test_value_stays_zero_without_price() {
        let fake = Fake { current_value: 0.0, price: None, slow_interval: None };
        let aggregator = SymbolAggregator::new(Arc::new(fake), &config(&["1h"]));
        let record = aggregator.aggregate("BTCUSDT", Utc::now()).await.unwrap();
        assert_eq!(record.current.open_interest_value, 0.0);
    }

    #[tokio::test]
    async fn test_failed_and_slow_intervals_are_omitted() {
        let fake = Fake { current_value: 500.0, price: None, slow_interval: Some("4h") };
        let aggregator = SymbolAggregator::new(Arc::new(fake), &config(&["5m", "1h", "4h", "1d"]));
        let record = aggregator.aggregate("BTCUSDT", Utc::now()).await.unwrap();

        let labels: Vec<_> = record.intervals.iter().map(|s| s.interval.as_str()).collect();
        assert_eq!(labels, vec!["5m", "1h"]);
        assert_eq!(record.net_inflow.len(), 10);
        assert!(record.net_inflow.values().all(|v| *v == Some(200.0)));
    }
}
