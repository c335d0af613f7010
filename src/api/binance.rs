use crate::config::BinanceConfig;
use crate::error::{AppError, Result};
use crate::models::{
    ExchangeInfo, FundingRate, Instrument, IntervalSample, KlineVolume, OpenInterest,
    OpenInterestHist, OpenInterestSample, PremiumIndexRaw, PriceTicker, Ticker24h, Ticker24hRaw,
};

use super::{ExchangeCatalog, HttpClient, MarketDataSource};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error};

/// Binance USDⓈ-M futures REST client.
pub struct BinanceClient {
    http: HttpClient,
    base_url: String,
}

impl BinanceClient {
    pub fn new(config: &BinanceConfig) -> Result<Self> {
        Ok(Self::with_http(HttpClient::new(config)?, &config.futures_base_url))
    }

    pub fn with_http(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 获取所有 TRADING 状态的 USDT 永续合约
    pub async fn exchange_instruments(&self) -> Result<Vec<Instrument>> {
        let info: ExchangeInfo = self
            .http
            .get_json(&self.url("/fapi/v1/exchangeInfo"), &[])
            .await?;

        Ok(info
            .symbols
            .into_iter()
            .filter(Instrument::is_tradable_usdt_perpetual)
            .collect())
    }

    /// 获取所有币种的24小时行情
    pub async fn all_tickers_24h(&self) -> Result<Vec<Ticker24h>> {
        let raw: Vec<Ticker24hRaw> = self
            .http
            .get_json(&self.url("/fapi/v1/ticker/24hr"), &[])
            .await?;

        // A single unparsable row should not hide the rest of the market.
        Ok(raw
            .into_iter()
            .filter_map(|t| Ticker24h::try_from(t).ok())
            .collect())
    }

    pub async fn try_current_open_interest(&self, symbol: &str) -> Result<OpenInterestSample> {
        let raw: OpenInterest = self
            .http
            .get_json(
                &self.url("/fapi/v1/openInterest"),
                &[("symbol", symbol.to_string())],
            )
            .await?;
        raw.try_into()
    }

    pub async fn try_historical_open_interest(
        &self,
        symbol: &str,
        interval: &str,
        min_points: u32,
    ) -> Result<Option<IntervalSample>> {
        let hist: Vec<OpenInterestHist> = self
            .http
            .get_json(
                &self.url("/futures/data/openInterestHist"),
                &[
                    ("symbol", symbol.to_string()),
                    ("period", interval.to_string()),
                    ("limit", min_points.max(2).to_string()),
                ],
            )
            .await?;

        hist.into_iter()
            .max_by_key(|h| h.timestamp)
            .map(|h| h.into_interval_sample(interval))
            .transpose()
    }

    pub async fn try_ticker_24h(&self, symbol: &str) -> Result<Ticker24h> {
        let raw: Ticker24hRaw = self
            .http
            .get_json(
                &self.url("/fapi/v1/ticker/24hr"),
                &[("symbol", symbol.to_string())],
            )
            .await?;
        raw.try_into()
    }

    pub async fn try_latest_price(&self, symbol: &str) -> Result<f64> {
        let ticker: PriceTicker = self
            .http
            .get_json(
                &self.url("/fapi/v2/ticker/price"),
                &[("symbol", symbol.to_string())],
            )
            .await?;
        ticker
            .price
            .parse()
            .map_err(|_| AppError::Parse(format!("price: invalid number {:?}", ticker.price)))
    }

    pub async fn try_funding_rate(&self, symbol: &str) -> Result<FundingRate> {
        let raw: PremiumIndexRaw = self
            .http
            .get_json(
                &self.url("/fapi/v1/premiumIndex"),
                &[("symbol", symbol.to_string())],
            )
            .await?;
        raw.try_into()
    }

    /// 获取期货K线数据
    pub async fn get_futures_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<KlineVolume>> {
        let data: Vec<Vec<Value>> = self
            .http
            .get_json(
                &self.url("/fapi/v1/klines"),
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", interval.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        let mut klines = Vec::with_capacity(data.len());
        for item in &data {
            klines.push(KlineVolume::from_binance_response(item)?);
        }
        Ok(klines)
    }
}

fn absorb<T>(what: &str, symbol: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            error!("Failed to fetch {} for {}: {}", what, symbol, e);
            None
        }
    }
}

#[async_trait]
impl MarketDataSource for BinanceClient {
    /// 获取当前持仓量
    async fn current_open_interest(&self, symbol: &str) -> Option<OpenInterestSample> {
        absorb(
            "open interest",
            symbol,
            self.try_current_open_interest(symbol).await,
        )
    }

    /// 获取历史持仓量
    async fn historical_open_interest(
        &self,
        symbol: &str,
        interval: &str,
        min_points: u32,
    ) -> Option<IntervalSample> {
        let sample = absorb(
            "open interest history",
            symbol,
            self.try_historical_open_interest(symbol, interval, min_points)
                .await,
        )?;
        if sample.is_none() {
            debug!("Empty open interest history for {} {}", symbol, interval);
        }
        sample
    }

    async fn ticker_24h(&self, symbol: &str) -> Option<Ticker24h> {
        absorb("24h ticker", symbol, self.try_ticker_24h(symbol).await)
    }

    async fn latest_price(&self, symbol: &str) -> Option<f64> {
        absorb("latest price", symbol, self.try_latest_price(symbol).await)
    }

    async fn funding_rate(&self, symbol: &str) -> Option<FundingRate> {
        absorb("funding rate", symbol, self.try_funding_rate(symbol).await)
    }

    async fn futures_kline_latest(&self, symbol: &str, interval: &str) -> Option<KlineVolume> {
        let klines = absorb(
            "futures kline",
            symbol,
            self.get_futures_klines(symbol, interval, 1).await,
        )?;
        klines.into_iter().last()
    }

    async fn aggregate_futures_kline(
        &self,
        symbol: &str,
        base_interval: &str,
        count: u32,
    ) -> Option<KlineVolume> {
        let count = count.clamp(1, 1000);
        let klines = absorb(
            "futures klines",
            symbol,
            self.get_futures_klines(symbol, base_interval, count).await,
        )?;
        let start = klines.len().saturating_sub(count as usize);
        KlineVolume::sum(&klines[start..])
    }
}

#[async_trait]
impl ExchangeCatalog for BinanceClient {
    async fn instruments(&self) -> Result<Vec<Instrument>> {
        self.exchange_instruments().await
    }

    async fn all_tickers(&self) -> Result<Vec<Ticker24h>> {
        self.all_tickers_24h().await
    }
}
