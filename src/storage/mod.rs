mod file;
mod markers;
mod registry;
mod snapshots;

pub use markers::{BucketMarker, JsonMarkerStore, MemoryMarkerStore, MARKER_RETENTION};
pub use registry::{SymbolRegistry, DEFAULT_SYMBOLS};
pub use snapshots::{JsonSnapshotStore, MemorySnapshotStore};

use crate::error::Result;
use crate::models::{SnapshotBatch, SymbolRecord};
use async_trait::async_trait;

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persists a batch as the newest one; readers never see it half-written.
    async fn put(&self, batch: &SnapshotBatch) -> Result<()>;

    /// Each symbol's record from the newest batch that contains it.
    async fn latest_per_symbol(&self) -> Result<Vec<SymbolRecord>>;

    /// `capturedAt` of the newest batch.
    async fn last_updated(&self) -> Result<Option<i64>>;
}

#[async_trait]
pub trait BucketMarkerStore: Send + Sync {
    async fn has(&self, bucket_key: i64) -> Result<bool>;

    async fn mark(&self, bucket_key: i64) -> Result<()>;

    async fn latest(&self) -> Result<Option<BucketMarker>>;
}
