use super::parse_decimal;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// 当前持仓量 (`/fapi/v1/openInterest`)
#[derive(Debug, Clone, Deserialize)]
pub struct OpenInterest {
    pub symbol: String,
    #[serde(rename = "openInterest")]
    pub open_interest: String,
    #[serde(rename = "sumOpenInterestValue", default)]
    pub open_interest_value: Option<String>,
    pub time: i64,
}

/// 历史持仓量 (`/futures/data/openInterestHist`)
#[derive(Debug, Clone, Deserialize)]
pub struct OpenInterestHist {
    pub symbol: String,
    #[serde(rename = "sumOpenInterest")]
    pub sum_open_interest: String,
    #[serde(rename = "sumOpenInterestValue", default)]
    pub sum_open_interest_value: Option<String>,
    pub timestamp: i64,
}

/// One open interest observation. `open_interest_value` is zero when the
/// upstream did not report it and nobody has backfilled it yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInterestSample {
    pub symbol: String,
    pub open_interest: f64,
    pub open_interest_value: f64,
    pub observed_at: i64,
}

impl OpenInterestSample {
    /// Price implied by value / quantity, undefined for an empty book.
    pub fn implied_price(&self) -> Option<f64> {
        if self.open_interest == 0.0 {
            None
        } else {
            Some(self.open_interest_value / self.open_interest)
        }
    }
}

/// Historical sample for one lookback interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalSample {
    pub interval: String,
    #[serde(flatten)]
    pub sample: OpenInterestSample,
}

impl TryFrom<OpenInterest> for OpenInterestSample {
    type Error = crate::error::AppError;

    fn try_from(raw: OpenInterest) -> Result<Self> {
        let open_interest_value = match raw.open_interest_value.as_deref() {
            Some(v) => parse_decimal(v, "sumOpenInterestValue")?,
            None => 0.0,
        };
        Ok(Self {
            open_interest: parse_decimal(&raw.open_interest, "openInterest")?,
            open_interest_value,
            observed_at: raw.time,
            symbol: raw.symbol,
        })
    }
}

impl OpenInterestHist {
    pub fn into_interval_sample(self, interval: &str) -> Result<IntervalSample> {
        let open_interest_value = match self.sum_open_interest_value.as_deref() {
            Some(v) => parse_decimal(v, "sumOpenInterestValue")?,
            None => 0.0,
        };
        Ok(IntervalSample {
            interval: interval.to_string(),
            sample: OpenInterestSample {
                open_interest: parse_decimal(&self.sum_open_interest, "sumOpenInterest")?,
                open_interest_value,
                observed_at: self.timestamp,
                symbol: self.symbol,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_without_value() {
        let raw: OpenInterest = serde_json::from_str(
            r#"{"symbol":"BTCUSDT","openInterest":"10659.509","time":1589437530011}"#,
        )
        .unwrap();
        let sample = OpenInterestSample::try_from(raw).unwrap();
        assert_eq!(sample.open_interest, 10659.509);
        assert_eq!(sample.open_interest_value, 0.0);
        assert_eq!(sample.observed_at, 1589437530011);
    }

    #[test]
    fn test_malformed_quantity() {
        let raw: OpenInterest = serde_json::from_str(
            r#"{"symbol":"BTCUSDT","openInterest":"n/a","time":1}"#,
        )
        .unwrap();
        assert!(OpenInterestSample::try_from(raw).is_err());
    }

    #[test]
    fn test_hist_sample_serializes_flat() {
        let raw: OpenInterestHist = serde_json::from_str(
            r#"{"symbol":"ETHUSDT","sumOpenInterest":"20403.63","sumOpenInterestValue":"150570784.07","timestamp":1583127900000}"#,
        )
        .unwrap();
        let sample = raw.into_interval_sample("1h").unwrap();
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["interval"], "1h");
        assert_eq!(json["openInterest"], 20403.63);
        assert_eq!(json["observedAt"], 1583127900000i64);
    }

    #[test]
    fn test_implied_price() {
        let mut sample = OpenInterestSample {
            symbol: "BTCUSDT".into(),
            open_interest: 2.0,
            open_interest_value: 100.0,
            observed_at: 0,
        };
        assert_eq!(sample.implied_price(), Some(50.0));
        sample.open_interest = 0.0;
        assert_eq!(sample.implied_price(), None);
    }
}
