use super::parse_decimal;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24hRaw {
    pub symbol: String,
    pub price_change: String,
    pub price_change_percent: String,
    pub last_price: String,
    pub high_price: String,
    pub low_price: String,
    pub volume: String,
    #[serde(default)]
    pub quote_volume: Option<String>,
}

/// 24小时价格变化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24h {
    pub symbol: String,
    pub price_change: f64,
    pub price_change_percent: f64,
    pub last_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub volume: f64,
    pub quote_volume: Option<f64>,
}

impl TryFrom<Ticker24hRaw> for Ticker24h {
    type Error = AppError;

    fn try_from(raw: Ticker24hRaw) -> Result<Self> {
        let quote_volume = match raw.quote_volume.as_deref() {
            Some(v) => Some(parse_decimal(v, "quoteVolume")?),
            None => None,
        };
        Ok(Self {
            price_change: parse_decimal(&raw.price_change, "priceChange")?,
            price_change_percent: parse_decimal(&raw.price_change_percent, "priceChangePercent")?,
            last_price: parse_decimal(&raw.last_price, "lastPrice")?,
            high_price: parse_decimal(&raw.high_price, "highPrice")?,
            low_price: parse_decimal(&raw.low_price, "lowPrice")?,
            volume: parse_decimal(&raw.volume, "volume")?,
            quote_volume,
            symbol: raw.symbol,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceTicker {
    pub symbol: String,
    pub price: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumIndexRaw {
    pub symbol: String,
    pub mark_price: String,
    pub index_price: String,
    #[serde(default)]
    pub estimated_settle_price: Option<String>,
    pub last_funding_rate: String,
    pub next_funding_time: i64,
    #[serde(default)]
    pub interest_rate: Option<String>,
    pub time: i64,
}

/// 资金费率
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRate {
    pub symbol: String,
    pub mark_price: f64,
    pub index_price: f64,
    pub estimated_settle_price: Option<f64>,
    pub last_funding_rate: f64,
    pub next_funding_time: i64,
    pub interest_rate: Option<f64>,
    pub time: i64,
}

impl TryFrom<PremiumIndexRaw> for FundingRate {
    type Error = AppError;

    fn try_from(raw: PremiumIndexRaw) -> Result<Self> {
        let optional = |v: Option<&str>, field: &str| -> Result<Option<f64>> {
            v.map(|s| parse_decimal(s, field)).transpose()
        };
        Ok(Self {
            mark_price: parse_decimal(&raw.mark_price, "markPrice")?,
            index_price: parse_decimal(&raw.index_price, "indexPrice")?,
            estimated_settle_price: optional(
                raw.estimated_settle_price.as_deref(),
                "estimatedSettlePrice",
            )?,
            last_funding_rate: parse_decimal(&raw.last_funding_rate, "lastFundingRate")?,
            next_funding_time: raw.next_funding_time,
            interest_rate: optional(raw.interest_rate.as_deref(), "interestRate")?,
            time: raw.time,
            symbol: raw.symbol,
        })
    }
}
