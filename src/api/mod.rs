mod binance;
mod client;
mod rate_limiter;

pub use binance::BinanceClient;
pub use client::{HttpClient, RetryPolicy};
pub use rate_limiter::RateLimiter;

use crate::error::Result;
use crate::models::{
    FundingRate, Instrument, IntervalSample, KlineVolume, OpenInterestSample, Ticker24h,
};
use async_trait::async_trait;

/// Per-symbol market metrics. Implementations log and absorb their own
/// failures: `None` means "metric unavailable", never "abort".
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn current_open_interest(&self, symbol: &str) -> Option<OpenInterestSample>;

    /// Most recent point of the open interest history for `interval`,
    /// requesting at least `min_points` (never fewer than 2) upstream.
    async fn historical_open_interest(
        &self,
        symbol: &str,
        interval: &str,
        min_points: u32,
    ) -> Option<IntervalSample>;

    async fn ticker_24h(&self, symbol: &str) -> Option<Ticker24h>;

    async fn latest_price(&self, symbol: &str) -> Option<f64>;

    async fn funding_rate(&self, symbol: &str) -> Option<FundingRate>;

    async fn futures_kline_latest(&self, symbol: &str, interval: &str) -> Option<KlineVolume>;

    /// Sum of the last `count` klines of `base_interval`.
    async fn aggregate_futures_kline(
        &self,
        symbol: &str,
        base_interval: &str,
        count: u32,
    ) -> Option<KlineVolume>;
}

/// Market-wide listings. Unlike [`MarketDataSource`], failures surface to
/// the caller.
#[async_trait]
pub trait ExchangeCatalog: Send + Sync {
    /// TRADING USDT perpetuals.
    async fn instruments(&self) -> Result<Vec<Instrument>>;

    async fn all_tickers(&self) -> Result<Vec<Ticker24h>>;
}
