use super::file::{load_json, save_json};
use super::SnapshotStore;
use crate::error::Result;
use crate::models::{SnapshotBatch, SymbolRecord};

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;

/// Newest batch first.
fn push_batch(history: &mut Vec<SnapshotBatch>, batch: &SnapshotBatch, retention: usize) {
    history.insert(0, batch.clone());
    history.truncate(retention.max(1));
}

fn latest_records(history: &[SnapshotBatch]) -> Vec<SymbolRecord> {
    let mut seen = HashSet::new();
    let mut records = Vec::new();
    for batch in history {
        for record in &batch.records {
            if seen.insert(record.symbol.as_str()) {
                records.push(record.clone());
            }
        }
    }
    records
}

/// Batch history in `snapshots.json`.
pub struct JsonSnapshotStore {
    path: PathBuf,
    retention: usize,
    write_lock: Mutex<()>,
}

impl JsonSnapshotStore {
    pub fn new(data_dir: &Path, retention: usize) -> Self {
        Self {
            path: data_dir.join("snapshots.json"),
            retention,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn history(&self) -> Result<Vec<SnapshotBatch>> {
        load_json(&self.path).await
    }
}

#[async_trait]
impl SnapshotStore for JsonSnapshotStore {
    async fn put(&self, batch: &SnapshotBatch) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut history = self.history().await?;
        push_batch(&mut history, batch, self.retention);
        save_json(&self.path, &history).await?;

        info!(
            "Saved batch {} with {} records ({} batches kept)",
            batch.batch_id,
            batch.len(),
            history.len()
        );
        Ok(())
    }

    async fn latest_per_symbol(&self) -> Result<Vec<SymbolRecord>> {
        Ok(latest_records(&self.history().await?))
    }

    async fn last_updated(&self) -> Result<Option<i64>> {
        Ok(self.history().await?.first().map(|b| b.captured_at))
    }
}

pub struct MemorySnapshotStore {
    retention: usize,
    history: Mutex<Vec<SnapshotBatch>>,
}

impl MemorySnapshotStore {
    pub fn new(retention: usize) -> Self {
        Self {
            retention,
            history: Mutex::new(Vec::new()),
        }
    }

    pub async fn batches(&self) -> Vec<SnapshotBatch> {
        self.history.lock().await.clone()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn put(&self, batch: &SnapshotBatch) -> Result<()> {
        push_batch(&mut *self.history.lock().await, batch, self.retention);
        Ok(())
    }

    async fn latest_per_symbol(&self) -> Result<Vec<SymbolRecord>> {
        Ok(latest_records(&self.history.lock().await))
    }

    async fn last_updated(&self) -> Result<Option<i64>> {
        Ok(self.history.lock().await.first().map(|b| b.captured_at))
    }
}
