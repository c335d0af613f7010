use crate::api::RetryPolicy;
use crate::models::interval_minutes;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub binance: BinanceConfig,
    pub refresh: RefreshConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BinanceConfig {
    pub futures_base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
    pub requests_per_minute: u32,
    pub proxy_url: Option<String>,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            futures_base_url: "https://fapi.binance.com".to_string(),
            timeout_secs: 10,
            max_retries: 3,
            backoff_base_ms: 500,
            backoff_cap_ms: 1500,
            requests_per_minute: 1200,
            proxy_url: None,
        }
    }
}

impl BinanceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.backoff_base_ms),
            max_delay: Duration::from_millis(self.backoff_cap_ms),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_secs: u64,
    pub time_intervals: Vec<String>,
    pub symbol_concurrency: usize,
    pub interval_concurrency: usize,
    pub symbol_timeout_secs: u64,
    pub interval_timeout_secs: u64,
    pub history_retention: usize,
    pub drop_list_size: usize,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            time_intervals: ["5m", "15m", "30m", "1h", "2h", "4h", "6h", "12h", "1d"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            symbol_concurrency: 2,
            interval_concurrency: 2,
            symbol_timeout_secs: 30,
            interval_timeout_secs: 30,
            history_retention: 20,
            drop_list_size: 100,
        }
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn symbol_timeout(&self) -> Duration {
        Duration::from_secs(self.symbol_timeout_secs)
    }

    pub fn interval_timeout(&self) -> Duration {
        Duration::from_secs(self.interval_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Settings {
    /// `config/default.toml`, then `COINX_*` environment variables
    /// (e.g. `COINX_REFRESH__INTERVAL_SECS=60`).
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                Environment::with_prefix("COINX")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("refresh.time_intervals")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(bad) = self
            .refresh
            .time_intervals
            .iter()
            .find(|i| interval_minutes(i).is_none())
        {
            return Err(ConfigError::Message(format!(
                "refresh.time_intervals: unsupported interval {bad:?}"
            )));
        }
        if self.refresh.symbol_concurrency == 0 || self.refresh.interval_concurrency == 0 {
            return Err(ConfigError::Message(
                "refresh concurrency limits must be at least 1".to_string(),
            ));
        }
        if self.refresh.history_retention == 0 {
            return Err(ConfigError::Message(
                "refresh.history_retention must be at least 1".to_string(),
            ));
        }
        if self.binance.backoff_cap_ms < self.binance.backoff_base_ms {
            return Err(ConfigError::Message(
                "binance.backoff_cap_ms must not be below backoff_base_ms".to_string(),
            ));
        }
        Ok(())
    }
}
