use super::file::{load_json, save_json};
use super::BucketMarkerStore;
use crate::error::Result;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// One hour of 5-minute buckets.
pub const MARKER_RETENTION: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketMarker {
    pub bucket_key: i64,
    pub created_at: i64,
}

/// Returns false when the key was already present.
fn insert_marker(markers: &mut Vec<BucketMarker>, bucket_key: i64) -> bool {
    if markers.iter().any(|m| m.bucket_key == bucket_key) {
        return false;
    }
    markers.push(BucketMarker {
        bucket_key,
        created_at: Utc::now().timestamp(),
    });
    markers.sort_by(|a, b| b.bucket_key.cmp(&a.bucket_key));
    markers.truncate(MARKER_RETENTION);
    true
}

fn newest(markers: &[BucketMarker]) -> Option<BucketMarker> {
    markers.iter().max_by_key(|m| m.bucket_key).cloned()
}

/// Markers in `cache_markers.json`.
pub struct JsonMarkerStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonMarkerStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("cache_markers.json"),
            write_lock: Mutex::new(()),
        }
    }

    async fn markers(&self) -> Result<Vec<BucketMarker>> {
        load_json(&self.path).await
    }
}

#[async_trait]
impl BucketMarkerStore for JsonMarkerStore {
    async fn has(&self, bucket_key: i64) -> Result<bool> {
        Ok(self.markers().await?.iter().any(|m| m.bucket_key == bucket_key))
    }

    async fn mark(&self, bucket_key: i64) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut markers = self.markers().await?;
        if insert_marker(&mut markers, bucket_key) {
            save_json(&self.path, &markers).await?;
        }
        Ok(())
    }

    async fn latest(&self) -> Result<Option<BucketMarker>> {
        Ok(newest(&self.markers().await?))
    }
}

#[derive(Default)]
pub struct MemoryMarkerStore {
    markers: Mutex<Vec<BucketMarker>>,
}

impl MemoryMarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.markers.lock().await.len()
    }
}

#[async_trait]
impl BucketMarkerStore for MemoryMarkerStore {
    async fn has(&self, bucket_key: i64) -> Result<bool> {
        Ok(self.markers.lock().await.iter().any(|m| m.bucket_key == bucket_key))
    }

    async fn mark(&self, bucket_key: i64) -> Result<()> {
        insert_marker(&mut *self.markers.lock().await, bucket_key);
        Ok(())
    }

    async fn latest(&self) -> Result<Option<BucketMarker>> {
        Ok(newest(&self.markers.lock().await))
    }
}
