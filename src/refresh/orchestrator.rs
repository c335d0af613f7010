use super::aggregator::SymbolAggregator;
use super::bucket::{bucket_key, should_refresh};
use super::pool::{BoundedPool, TaskOutcome};
use crate::config::RefreshConfig;
use crate::models::{SnapshotBatch, SymbolRecord};
use crate::storage::{BucketMarkerStore, SnapshotStore, SymbolRegistry};

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Cache-gated refresh of the whole symbol fleet.
pub struct RefreshService {
    aggregator: Arc<SymbolAggregator>,
    registry: Arc<SymbolRegistry>,
    snapshots: Arc<dyn SnapshotStore>,
    markers: Arc<dyn BucketMarkerStore>,
    symbol_pool: BoundedPool,
    in_flight: Mutex<()>,
    clock: Clock,
}

impl RefreshService {
    pub fn new(
        aggregator: Arc<SymbolAggregator>,
        registry: Arc<SymbolRegistry>,
        snapshots: Arc<dyn SnapshotStore>,
        markers: Arc<dyn BucketMarkerStore>,
        config: &RefreshConfig,
    ) -> Self {
        Self {
            aggregator,
            registry,
            snapshots,
            markers,
            symbol_pool: BoundedPool::new(
                "symbols",
                config.symbol_concurrency,
                config.symbol_timeout(),
            ),
            in_flight: Mutex::new(()),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    pub fn aggregator(&self) -> &Arc<SymbolAggregator> {
        &self.aggregator
    }

    pub fn registry(&self) -> &Arc<SymbolRegistry> {
        &self.registry
    }

    pub fn snapshots(&self) -> &Arc<dyn SnapshotStore> {
        &self.snapshots
    }

    pub async fn is_current(&self) -> bool {
        !should_refresh(self.markers.as_ref(), self.now()).await
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Returns `None` when skipped (bucket already current, or another
    /// refresh in flight), otherwise the records that aggregated.
    pub async fn refresh_all(
        &self,
        symbols: Option<Vec<String>>,
        force: bool,
    ) -> Option<Vec<SymbolRecord>> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            info!("Refresh already in progress, skipping");
            return None;
        };

        let now = self.now();
        let key = bucket_key(now);
        if !force && !should_refresh(self.markers.as_ref(), now).await {
            info!("Bucket {} is current, skipping refresh", key);
            return None;
        }

        let symbols = match symbols {
            Some(symbols) => symbols,
            None => self.registry.tracked_symbols().await,
        };
        if symbols.is_empty() {
            warn!("No symbols to refresh");
            return Some(Vec::new());
        }

        info!("Refreshing {} symbols (bucket {}, force={})", symbols.len(), key, force);

        let aggregator = Arc::clone(&self.aggregator);
        let outcomes = self
            .symbol_pool
            .run(symbols.clone(), move |symbol: String| {
                let aggregator = Arc::clone(&aggregator);
                async move { aggregator.aggregate(&symbol, now).await }
            })
            .await;

        let mut records = Vec::with_capacity(symbols.len());
        for (symbol, outcome) in symbols.iter().zip(outcomes) {
            match outcome {
                TaskOutcome::Succeeded(record) => records.push(record),
                TaskOutcome::TimedOut => warn!("Aggregation for {} timed out", symbol),
                TaskOutcome::Failed(e) => warn!("Aggregation for {} failed: {}", symbol, e),
            }
        }

        if records.is_empty() {
            warn!("No symbol aggregated, nothing persisted");
            return Some(records);
        }

        let batch = SnapshotBatch::new(now.timestamp_millis(), records);
        match self.snapshots.put(&batch).await {
            Ok(()) => {
                if let Err(e) = self.markers.mark(key).await {
                    error!("Failed to mark bucket {}: {}", key, e);
                }
            }
            Err(e) => error!("Failed to persist batch {}: {}", batch.batch_id, e),
        }

        info!(
            "Refresh complete: {}/{} symbols",
            batch.len(),
            symbols.len()
        );
        Some(batch.records)
    }
}
