use super::{IntervalSample, OpenInterestSample, Ticker24h};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Look-back windows for the net inflow estimate, shortest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NetInflowPeriod {
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "8h")]
    H8,
    #[serde(rename = "12h")]
    H12,
    #[serde(rename = "24h")]
    H24,
    #[serde(rename = "72h")]
    H72,
    #[serde(rename = "168h")]
    H168,
}

impl NetInflowPeriod {
    pub const ALL: [NetInflowPeriod; 10] = [
        Self::M5,
        Self::M15,
        Self::M30,
        Self::H1,
        Self::H4,
        Self::H8,
        Self::H12,
        Self::H24,
        Self::H72,
        Self::H168,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::M5 => "5m",
            Self::M15 => "15m",
            Self::M30 => "30m",
            Self::H1 => "1h",
            Self::H4 => "4h",
            Self::H8 => "8h",
            Self::H12 => "12h",
            Self::H24 => "24h",
            Self::H72 => "72h",
            Self::H168 => "168h",
        }
    }
}

/// Estimated net inflow per period, `None` where no kline could be obtained.
pub type NetInflow = BTreeMap<NetInflowPeriod, Option<f64>>;

/// Everything one refresh cycle learned about one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolRecord {
    pub symbol: String,
    pub current: OpenInterestSample,
    pub intervals: Vec<IntervalSample>,
    pub price_change: Option<Ticker24h>,
    pub net_inflow: NetInflow,
    pub captured_at: i64,
}

impl SymbolRecord {
    pub fn interval(&self, interval: &str) -> Option<&IntervalSample> {
        self.intervals.iter().find(|s| s.interval == interval)
    }
}

/// Records persisted together by one refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotBatch {
    pub batch_id: Uuid,
    pub captured_at: i64,
    pub records: Vec<SymbolRecord>,
}

impl SnapshotBatch {
    pub fn new(captured_at: i64, records: Vec<SymbolRecord>) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            captured_at,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
