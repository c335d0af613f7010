use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Volume part of a futures kline, or the sum over several klines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KlineVolume {
    pub open_time: Option<i64>,
    pub close_time: Option<i64>,
    pub quote_volume: f64,
    pub taker_buy_quote_volume: f64,
}

impl KlineVolume {
    /// Binance kline row:
    /// `[openTime, open, high, low, close, volume, closeTime, quoteVolume,
    ///   count, takerBuyBaseVolume, takerBuyQuoteVolume, ignore]`
    pub fn from_binance_response(data: &[Value]) -> Result<Self> {
        if data.len() < 11 {
            return Err(AppError::Parse("Invalid kline data format".to_string()));
        }

        let parse_f64 = |v: &Value| -> Result<f64> {
            v.as_str()
                .ok_or_else(|| AppError::Parse("Expected string".to_string()))?
                .parse()
                .map_err(|_| AppError::Parse("Failed to parse float".to_string()))
        };

        Ok(KlineVolume {
            open_time: Some(
                data[0]
                    .as_i64()
                    .ok_or_else(|| AppError::Parse("Invalid open_time".to_string()))?,
            ),
            close_time: Some(
                data[6]
                    .as_i64()
                    .ok_or_else(|| AppError::Parse("Invalid close_time".to_string()))?,
            ),
            quote_volume: parse_f64(&data[7])?,
            taker_buy_quote_volume: parse_f64(&data[10])?,
        })
    }

    /// Sums quote and taker-buy quote volume. Returns `None` for an empty slice.
    pub fn sum(klines: &[KlineVolume]) -> Option<Self> {
        if klines.is_empty() {
            return None;
        }
        let (quote_volume, taker_buy_quote_volume) = klines
            .iter()
            .fold((0.0, 0.0), |(q, t), k| (q + k.quote_volume, t + k.taker_buy_quote_volume));

        Some(KlineVolume {
            open_time: None,
            close_time: None,
            quote_volume,
            taker_buy_quote_volume,
        })
    }
}
