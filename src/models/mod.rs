mod coin;
mod interval;
mod kline;
mod open_interest;
mod record;
mod ticker;

pub use coin::{CoinEntry, ExchangeInfo, Instrument};
pub use interval::interval_minutes;
pub use kline::KlineVolume;
pub use open_interest::{IntervalSample, OpenInterest, OpenInterestHist, OpenInterestSample};
pub use record::{NetInflow, NetInflowPeriod, SnapshotBatch, SymbolRecord};
pub use ticker::{FundingRate, PremiumIndexRaw, PriceTicker, Ticker24h, Ticker24hRaw};

use crate::error::{AppError, Result};

/// Binance sends decimals as strings.
pub(crate) fn parse_decimal(value: &str, field: &str) -> Result<f64> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Parse(format!("{field}: invalid number {value:?}")))
}
