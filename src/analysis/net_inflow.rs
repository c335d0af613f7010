use crate::api::MarketDataSource;
use crate::models::{KlineVolume, NetInflow, NetInflowPeriod};

use tracing::{debug, warn};

/// Taker buy minus taker sell quote volume.
///
/// buy + sell = quoteVolume and buy - sell = net, so net = 2 * buy - quoteVolume.
pub fn estimate(volume: &KlineVolume) -> f64 {
    2.0 * volume.taker_buy_quote_volume - volume.quote_volume
}

/// Kline interval whose latest candle covers exactly `period`.
pub fn native_interval(period: NetInflowPeriod) -> &'static str {
    match period {
        NetInflowPeriod::H24 => "1d",
        NetInflowPeriod::H72 => "3d",
        NetInflowPeriod::H168 => "1w",
        other => other.as_str(),
    }
}

/// Finer-grained basis used when the native kline is unavailable:
/// minutes sum 5m candles, hours and days sum 1h candles.
pub fn fallback_basis(label: &str) -> Option<(&'static str, u32)> {
    if label.len() < 2 {
        return None;
    }
    let (value, unit) = label.split_at(label.len() - 1);
    let value: u32 = value.parse().ok()?;
    match unit {
        "m" => Some(("5m", (value / 5).max(1))),
        "h" => Some(("1h", value.max(1))),
        "d" => Some(("1h", (value * 24).max(1))),
        _ => None,
    }
}

/// Net inflow estimate for every [`NetInflowPeriod`].
pub async fn net_inflow(source: &dyn MarketDataSource, symbol: &str) -> NetInflow {
    let mut result = NetInflow::new();

    for period in NetInflowPeriod::ALL {
        let volume = match source
            .futures_kline_latest(symbol, native_interval(period))
            .await
        {
            Some(kline) => Some(kline),
            None => match fallback_basis(period.as_str()) {
                Some((base, count)) => {
                    debug!(
                        "Net inflow fallback for {} {}: {} x {}",
                        symbol,
                        period.as_str(),
                        base,
                        count
                    );
                    source.aggregate_futures_kline(symbol, base, count).await
                }
                None => None,
            },
        };

        if volume.is_none() {
            warn!("No kline data for {} net inflow {}", symbol, period.as_str());
        }
        result.insert(period, volume.as_ref().map(estimate));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FundingRate, IntervalSample, OpenInterestSample, Ticker24h};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn volume(quote: f64, taker_buy: f64) -> KlineVolume {
        KlineVolume {
            open_time: None,
            close_time: None,
            quote_volume: quote,
            taker_buy_quote_volume: taker_buy,
        }
    }

    /// Serves native klines only for the listed intervals and records
    /// aggregate calls.
    struct KlineOnly {
        native: Vec<&'static str>,
        aggregates_available: bool,
        aggregate_calls: Mutex<Vec<(String, u32)>>,
    }

    #[async_trait]
    impl MarketDataSource for KlineOnly {
        async fn current_open_interest(&self, _: &str) -> Option<OpenInterestSample> {
            None
        }
        async fn historical_open_interest(&self, _: &str, _: &str, _: u32) -> Option<IntervalSample> {
            None
        }
        async fn ticker_24h(&self, _: &str) -> Option<Ticker24h> {
            None
        }
        async fn latest_price(&self, _: &str) -> Option<f64> {
            None
        }
        async fn funding_rate(&self, _: &str) -> Option<FundingRate> {
            None
        }
        async fn futures_kline_latest(&self, _: &str, interval: &str) -> Option<KlineVolume> {
            self.native
                .iter()
                .any(|n| *n == interval)
                .then(|| volume(1000.0, 600.0))
        }
        async fn aggregate_futures_kline(&self, _: &str, base: &str, count: u32) -> Option<KlineVolume> {
            self.aggregate_calls
                .lock()
                .unwrap()
                .push((base.to_string(), count));
            self.aggregates_available
                .then(|| volume(100.0 * count as f64, 10.0 * count as f64))
        }
    }

    #[test]
    fn test_estimate_formula() {
        assert_eq!(estimate(&volume(1000.0, 600.0)), 200.0);
        assert_eq!(estimate(&volume(1000.0, 400.0)), -200.0);
    }

    #[test]
    fn test_native_interval_mapping() {
        assert_eq!(native_interval(NetInflowPeriod::M5), "5m");
        assert_eq!(native_interval(NetInflowPeriod::H12), "12h");
        assert_eq!(native_interval(NetInflowPeriod::H24), "1d");
        assert_eq!(native_interval(NetInflowPeriod::H72), "3d");
        assert_eq!(native_interval(NetInflowPeriod::H168), "1w");
    }

    #[test]
    fn test_fallback_basis() {
        assert_eq!(fallback_basis("5m"), Some(("5m", 1)));
        assert_eq!(fallback_basis("30m"), Some(("5m", 6)));
        assert_eq!(fallback_basis("8h"), Some(("1h", 8)));
        assert_eq!(fallback_basis("168h"), Some(("1h", 168)));
        assert_eq!(fallback_basis("3d"), Some(("1h", 72)));
        assert_eq!(fallback_basis("1w"), None);
    }

    #[tokio::test]
    async fn test_native_klines_used_when_available() {
        let source = KlineOnly {
            native: vec!["5m", "15m", "30m", "1h", "4h", "8h", "12h", "1d", "3d", "1w"],
            aggregates_available: true,
            aggregate_calls: Mutex::new(Vec::new()),
        };
        let inflow = net_inflow(&source, "BTCUSDT").await;
        assert_eq!(inflow.len(), 10);
        assert!(inflow.values().all(|v| *v == Some(200.0)));
        assert!(source.aggregate_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_falls_back_to_aggregation() {
        let source = KlineOnly {
            native: vec!["5m", "15m", "30m", "1h", "4h", "12h", "1d", "3d", "1w"],
            aggregates_available: true,
            aggregate_calls: Mutex::new(Vec::new()),
        };
        let inflow = net_inflow(&source, "BTCUSDT").await;

        // 8h synthesized from 1h x 8: 2 * 80 - 800
        assert_eq!(inflow[&NetInflowPeriod::H8], Some(-640.0));
        assert_eq!(
            *source.aggregate_calls.lock().unwrap(),
            vec![("1h".to_string(), 8)]
        );
    }

    #[tokio::test]
    async fn test_none_when_both_paths_fail() {
        let source = KlineOnly {
            native: vec![],
            aggregates_available: false,
            aggregate_calls: Mutex::new(Vec::new()),
        };
        let inflow = net_inflow(&source, "BTCUSDT").await;
        assert_eq!(inflow.len(), 10);
        assert!(inflow.values().all(Option::is_none));
        assert_eq!(source.aggregate_calls.lock().unwrap().len(), 10);
    }
}
