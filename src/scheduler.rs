use crate::api::ExchangeCatalog;
use crate::error::Result;
use crate::refresh::RefreshService;
use crate::storage::SymbolRegistry;

use chrono::{DateTime, Days, NaiveTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Pulls exchange info into the registry.
pub async fn sync_registry(catalog: &dyn ExchangeCatalog, registry: &SymbolRegistry) -> Result<usize> {
    let instruments = catalog.instruments().await?;
    info!("Fetched {} tradable perpetual contracts", instruments.len());
    registry.sync(&instruments).await
}

/// Time left until the next 00:00 UTC.
pub fn duration_until_next_midnight(now: DateTime<Utc>) -> Duration {
    let next = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .map(|day| day.and_time(NaiveTime::MIN).and_utc());
    match next {
        Some(next) => (next - now).to_std().unwrap_or(Duration::ZERO),
        None => Duration::from_secs(24 * 60 * 60),
    }
}

/// Fires a non-forced refresh every `period` until shutdown. The first tick
/// is immediate.
pub async fn run_refresh_loop(
    service: Arc<RefreshService>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!("Refresh loop started, every {}s", period.as_secs());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(records) = service.refresh_all(None, false).await {
                    info!("Scheduled refresh stored {} records", records.len());
                }
            }
            _ = shutdown.changed() => {
                info!("Refresh loop stopping");
                return;
            }
        }
    }
}

/// Syncs the registry at every 00:00 UTC until shutdown.
pub async fn run_daily_sync(
    catalog: Arc<dyn ExchangeCatalog>,
    registry: Arc<SymbolRegistry>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let wait = duration_until_next_midnight(Utc::now());
        info!("Next registry sync in {:.1} hours", wait.as_secs_f64() / 3600.0);

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                match sync_registry(catalog.as_ref(), &registry).await {
                    Ok(added) => info!("Daily sync complete, {} new symbols", added),
                    Err(e) => error!("Daily sync failed: {}", e),
                }
            }
            _ = shutdown.changed() => {
                info!("Daily sync stopping");
                return;
            }
        }
    }
}
