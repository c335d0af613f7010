use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovRateLimiter,
};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;

/// Request quota shared by every upstream call.
pub struct RateLimiter {
    limiter: GovRateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(nonzero!(1u32));
        Self {
            limiter: GovRateLimiter::direct(Quota::per_minute(per_minute)),
        }
    }

    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_burst_within_quota_is_immediate() {
        let limiter = RateLimiter::new(60);
        let started = std::time::Instant::now();
        for _ in 0..10 {
            limiter.acquire().await;
        }
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_zero_quota_falls_back_to_one() {
        let limiter = RateLimiter::new(0);
        tokio::time::timeout(Duration::from_millis(500), limiter.acquire())
            .await
            .expect("first permit is available immediately");
    }
}
