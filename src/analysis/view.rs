use super::format::format_optional;
use crate::models::{interval_minutes, IntervalSample, NetInflow, OpenInterestSample, SymbolRecord};

use serde::Serialize;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage change against a historical base. A zero base yields 0.
fn ratio(current: f64, historical: f64) -> f64 {
    if historical == 0.0 {
        0.0
    } else {
        round2((current - historical) / historical * 100.0)
    }
}

/// Current sample compared with the historical sample of one interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalChange {
    pub interval: String,
    pub open_interest_ratio: Option<f64>,
    pub open_interest_value_ratio: Option<f64>,
    pub price_change_abs: Option<f64>,
    pub price_change_percent: Option<f64>,
    pub open_interest: Option<f64>,
    pub open_interest_formatted: String,
    pub open_interest_value: Option<f64>,
    pub open_interest_value_formatted: String,
    pub price: Option<f64>,
    pub price_formatted: String,
}

impl IntervalChange {
    pub fn compute(
        interval: &str,
        current: &OpenInterestSample,
        historical: Option<&IntervalSample>,
    ) -> Self {
        let Some(historical) = historical.map(|h| &h.sample) else {
            return Self::missing(interval);
        };

        let current_price = current.implied_price();
        let past_price = historical.implied_price();

        let (price_change_abs, price_change_percent) = match (current_price, past_price) {
            (Some(cur), Some(past)) => {
                let abs = cur - past;
                let pct = if past == 0.0 { 0.0 } else { round2(abs / past * 100.0) };
                (Some(abs), Some(pct))
            }
            _ => (None, None),
        };

        Self {
            interval: interval.to_string(),
            open_interest_ratio: Some(ratio(current.open_interest, historical.open_interest)),
            open_interest_value_ratio: Some(ratio(
                current.open_interest_value,
                historical.open_interest_value,
            )),
            price_change_abs,
            price_change_percent,
            open_interest: Some(historical.open_interest),
            open_interest_formatted: format_optional(Some(historical.open_interest)),
            open_interest_value: Some(historical.open_interest_value),
            open_interest_value_formatted: format_optional(Some(historical.open_interest_value)),
            price: past_price,
            price_formatted: format_optional(past_price),
        }
    }

    fn missing(interval: &str) -> Self {
        Self {
            interval: interval.to_string(),
            open_interest_ratio: None,
            open_interest_value_ratio: None,
            price_change_abs: None,
            price_change_percent: None,
            open_interest: None,
            open_interest_formatted: format_optional(None),
            open_interest_value: None,
            open_interest_value_formatted: format_optional(None),
            price: None,
            price_formatted: format_optional(None),
        }
    }
}

/// Dashboard row for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinView {
    pub symbol: String,
    pub open_interest: f64,
    pub open_interest_formatted: String,
    pub open_interest_value: f64,
    pub open_interest_value_formatted: String,
    pub price: Option<f64>,
    pub price_formatted: String,
    pub price_change: Option<f64>,
    pub price_change_percent: Option<f64>,
    pub price_change_formatted: String,
    pub net_inflow: NetInflow,
    pub changes: Vec<IntervalChange>,
    pub captured_at: i64,
}

impl CoinView {
    /// One change entry per configured interval, shortest first.
    pub fn from_record(record: &SymbolRecord, intervals: &[String]) -> Self {
        let mut ordered: Vec<&String> = intervals.iter().collect();
        ordered.sort_by_key(|label| interval_minutes(label).unwrap_or(u32::MAX));
        ordered.dedup();

        let changes = ordered
            .into_iter()
            .map(|label| IntervalChange::compute(label, &record.current, record.interval(label)))
            .collect();

        let price = record.current.implied_price();
        let price_change = record.price_change.as_ref().map(|t| t.price_change);

        Self {
            symbol: record.symbol.clone(),
            open_interest: record.current.open_interest,
            open_interest_formatted: format_optional(Some(record.current.open_interest)),
            open_interest_value: record.current.open_interest_value,
            open_interest_value_formatted: format_optional(Some(
                record.current.open_interest_value,
            )),
            price,
            price_formatted: format_optional(price),
            price_change,
            price_change_percent: record.price_change.as_ref().map(|t| t.price_change_percent),
            price_change_formatted: format_optional(price_change),
            net_inflow: record.net_inflow.clone(),
            changes,
            captured_at: record.captured_at,
        }
    }
}
