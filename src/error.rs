use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Binance API error: {0}")]
    BinanceApi(String),

    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("Request to {url} failed after {attempts} attempts: {reason}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("Malformed response: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Worker pool unavailable: {0}")]
    Pool(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
