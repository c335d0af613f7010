use crate::config::BinanceConfig;
use crate::error::{AppError, Result};

use super::RateLimiter;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Exponential backoff with a hard ceiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(1500),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`, capped.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

/// GET-only client over one pooled `reqwest::Client`. Timeouts, connection
/// failures and HTTP 403/429 are retried under the [`RetryPolicy`].
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(config: &BinanceConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh-CN,zh;q=0.9"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            ),
        );

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60));

        if let Some(proxy_url) = config.proxy_url.as_deref().filter(|p| !p.is_empty()) {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
            debug!("Using proxy {}", proxy_url);
        }

        Ok(Self {
            client: builder.build()?,
            rate_limiter: Arc::new(RateLimiter::new(config.requests_per_minute)),
            policy: config.retry_policy(),
            timeout: config.timeout(),
        })
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// GET `url` and return the full response body of the first successful attempt.
    pub async fn get(&self, url: &str, params: &[(&str, String)]) -> Result<Vec<u8>> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            self.rate_limiter.acquire().await;

            let reason = match self.attempt(url, params).await {
                Ok(Attempt::Body(bytes)) => return Ok(bytes),
                Ok(Attempt::Retry(reason)) => reason,
                Err(e) => return Err(e),
            };

            if attempt > self.policy.max_retries {
                return Err(AppError::RetriesExhausted {
                    url: url.to_string(),
                    attempts: attempt,
                    reason,
                });
            }

            let delay = self.policy.delay_for(attempt);
            warn!(
                "Request failed, retrying in {:.2}s ({}/{}): {}, error: {}",
                delay.as_secs_f64(),
                attempt,
                self.policy.max_retries,
                url,
                reason
            );
            tokio::time::sleep(delay).await;
        }
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let body = self.get(url, params).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// One request including the body read.
    async fn attempt(&self, url: &str, params: &[(&str, String)]) -> Result<Attempt> {
        let response = match self
            .client
            .get(url)
            .query(params)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if is_transient(&e) => return Ok(Attempt::Retry(e.to_string())),
            Err(e) => return Err(e.into()),
        };

        let status = response.status();
        if is_throttled(status) {
            return Ok(Attempt::Retry(format!("HTTP {status}")));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::BinanceApi(format!("Status {status}: {text}")));
        }

        match response.bytes().await {
            Ok(bytes) => Ok(Attempt::Body(bytes.to_vec())),
            Err(e) => Ok(Attempt::Retry(format!("body read failed: {e}"))),
        }
    }
}

enum Attempt {
    Body(Vec<u8>),
    Retry(String),
}

fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_request()
}

fn is_throttled(status: StatusCode) -> bool {
    status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS
}
