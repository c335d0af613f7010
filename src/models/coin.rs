use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ExchangeInfo {
    pub symbols: Vec<Instrument>,
}

/// Instrument entry from `/fapi/v1/exchangeInfo`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub symbol: String,
    #[serde(default)]
    pub contract_type: String,
    pub status: String,
    #[serde(default)]
    pub base_asset: Option<String>,
    #[serde(default)]
    pub quote_asset: Option<String>,
    #[serde(default)]
    pub margin_asset: Option<String>,
    #[serde(default)]
    pub price_precision: Option<u32>,
    #[serde(default)]
    pub quantity_precision: Option<u32>,
    #[serde(default)]
    pub onboard_date: Option<i64>,
}

impl Instrument {
    /// TRADING USDT-quoted perpetual.
    pub fn is_tradable_usdt_perpetual(&self) -> bool {
        self.status == "TRADING"
            && self.contract_type == "PERPETUAL"
            && self.quote_asset.as_deref() == Some("USDT")
    }
}

/// 币种配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinEntry {
    pub symbol: String,
    pub is_tracking: bool,
    #[serde(default)]
    pub base_asset: Option<String>,
    #[serde(default)]
    pub quote_asset: Option<String>,
    #[serde(default)]
    pub margin_asset: Option<String>,
    #[serde(default)]
    pub price_precision: Option<u32>,
    #[serde(default)]
    pub quantity_precision: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub contract_type: Option<String>,
    #[serde(default)]
    pub onboard_date: Option<i64>,
    pub updated_at: i64,
}

impl CoinEntry {
    pub fn new(symbol: &str, is_tracking: bool, updated_at: i64) -> Self {
        Self {
            symbol: symbol.to_string(),
            is_tracking,
            base_asset: None,
            quote_asset: None,
            margin_asset: None,
            price_precision: None,
            quantity_precision: None,
            status: None,
            contract_type: None,
            onboard_date: None,
            updated_at,
        }
    }

    /// Refreshes instrument metadata, leaving the tracking flag alone.
    pub fn apply_instrument(&mut self, instrument: &Instrument, updated_at: i64) {
        self.base_asset = instrument.base_asset.clone();
        self.quote_asset = instrument.quote_asset.clone();
        self.margin_asset = instrument.margin_asset.clone();
        self.price_precision = instrument.price_precision;
        self.quantity_precision = instrument.quantity_precision;
        self.status = Some(instrument.status.clone());
        self.contract_type = Some(instrument.contract_type.clone());
        self.onboard_date = instrument.onboard_date;
        self.updated_at = updated_at;
    }
}
