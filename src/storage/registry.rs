use super::file::{load_json, save_json};
use crate::error::{AppError, Result};
use crate::models::{CoinEntry, Instrument};

use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::info;

/// 默认跟踪的币种
pub const DEFAULT_SYMBOLS: [&str; 3] = ["BTCUSDT", "ETHUSDT", "BNBUSDT"];

fn seeded() -> BTreeMap<String, CoinEntry> {
    let now = Utc::now().timestamp();
    DEFAULT_SYMBOLS
        .iter()
        .map(|s| (s.to_string(), CoinEntry::new(s, true, now)))
        .collect()
}

/// Known symbols and their tracking flags, optionally persisted to
/// `coins.json`.
pub struct SymbolRegistry {
    entries: RwLock<BTreeMap<String, CoinEntry>>,
    path: Option<PathBuf>,
}

impl SymbolRegistry {
    /// Loads `coins.json` from `data_dir`, seeding the defaults when empty.
    pub async fn open(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join("coins.json");
        let mut entries: BTreeMap<String, CoinEntry> = load_json(&path).await?;
        if entries.is_empty() {
            entries = seeded();
            save_json(&path, &entries).await?;
            info!("Seeded symbol registry with {:?}", DEFAULT_SYMBOLS);
        }
        Ok(Self {
            entries: RwLock::new(entries),
            path: Some(path),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            entries: RwLock::new(seeded()),
            path: None,
        }
    }

    async fn persist(&self, entries: &BTreeMap<String, CoinEntry>) -> Result<()> {
        match &self.path {
            Some(path) => save_json(path, entries).await,
            None => Ok(()),
        }
    }

    pub async fn tracked_symbols(&self) -> Vec<String> {
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.is_tracking)
            .map(|e| e.symbol.clone())
            .collect()
    }

    pub async fn all_known_symbols(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }

    pub async fn tracking_map(&self) -> BTreeMap<String, bool> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(symbol, e)| (symbol.clone(), e.is_tracking))
            .collect()
    }

    pub async fn get(&self, symbol: &str) -> Option<CoinEntry> {
        self.entries.read().await.get(symbol).cloned()
    }

    /// True until the first successful exchange sync populated metadata.
    pub async fn needs_sync(&self) -> bool {
        self.entries
            .read()
            .await
            .values()
            .all(|e| e.status.is_none())
    }

    /// Changes become visible only once persisted.
    pub async fn set_tracking(&self, symbol: &str, tracked: bool) -> Result<()> {
        let mut entries = self.entries.write().await;
        let now = Utc::now().timestamp();
        let mut next = entries.clone();
        next
            .entry(symbol.to_string())
            .and_modify(|e| {
                e.is_tracking = tracked;
                e.updated_at = now;
            })
            .or_insert_with(|| CoinEntry::new(symbol, tracked, now));
        self.persist(&next).await?;
        *entries = next;

        info!("Set tracking for {} to {}", symbol, tracked);
        Ok(())
    }

    pub async fn remove(&self, symbol: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        let mut next = entries.clone();
        if next.remove(symbol).is_none() {
            return Err(AppError::SymbolNotFound(symbol.to_string()));
        }
        self.persist(&next).await?;
        *entries = next;

        info!("Removed {} from registry", symbol);
        Ok(())
    }

    /// Upserts every instrument. New symbols start untracked, existing ones
    /// keep their flag. Returns how many symbols were added.
    pub async fn sync(&self, instruments: &[Instrument]) -> Result<usize> {
        let mut entries = self.entries.write().await;
        let now = Utc::now().timestamp();
        let mut next = entries.clone();
        let mut added = 0;

        for instrument in instruments {
            let entry = next.entry(instrument.symbol.clone()).or_insert_with(|| {
                added += 1;
                CoinEntry::new(&instrument.symbol, false, now)
            });
            entry.apply_instrument(instrument, now);
        }
        self.persist(&next).await?;
        *entries = next;

        info!(
            "Synced {} instruments, {} new, {} known",
            instruments.len(),
            added,
            entries.len()
        );
        Ok(added)
    }
}
