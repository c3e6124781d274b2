use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::feed::Category;
use crate::storage;

/// Outcome of offering a timestamp to the watermark of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The category had no watermark; it now holds the offered timestamp.
    WarmUp,
    /// The timestamp was strictly newer and the watermark moved to it.
    Advanced { previous: DateTime<Utc> },
    /// The timestamp was not newer; the watermark is unchanged.
    Stale { watermark: DateTime<Utc> },
}

/// Per-category cursor of the newest entry timestamp confirmed so far.
///
/// The watermark never moves backward. Without a backing path the store
/// lives for the process only, so every restart begins with a warm-up cycle.
#[derive(Debug, Clone)]
pub struct WatermarkStore {
    inner: Arc<RwLock<HashMap<Category, DateTime<Utc>>>>,
    path: Option<PathBuf>,
}

impl WatermarkStore {
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            path: None,
        }
    }

    pub async fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let data: HashMap<Category, DateTime<Utc>> = storage::read_json_or_default(&path).await;
        Self {
            inner: Arc::new(RwLock::new(data)),
            path: Some(path),
        }
    }

    pub async fn get(&self, category: Category) -> Option<DateTime<Utc>> {
        self.inner.read().await.get(&category).copied()
    }

    /// Raises the watermark to `timestamp`; lower values are ignored.
    pub async fn set(&self, category: Category, timestamp: DateTime<Utc>) {
        let mut inner = self.inner.write().await;
        let current = inner.entry(category).or_insert(timestamp);
        if timestamp > *current {
            *current = timestamp;
        }
        self.persist(&inner).await;
    }

    /// Compares `timestamp` against the category watermark and moves it
    /// forward when the timestamp is new, in one step.
    pub async fn observe(&self, category: Category, timestamp: DateTime<Utc>) -> Observation {
        let mut inner = self.inner.write().await;
        let observation = match inner.get(&category).copied() {
            None => {
                inner.insert(category, timestamp);
                Observation::WarmUp
            }
            Some(previous) if timestamp > previous => {
                inner.insert(category, timestamp);
                Observation::Advanced { previous }
            }
            Some(watermark) => Observation::Stale { watermark },
        };
        if !matches!(observation, Observation::Stale { .. }) {
            self.persist(&inner).await;
        }
        observation
    }

    /// Called with the write guard held.
    async fn persist(&self, snapshot: &HashMap<Category, DateTime<Utc>>) {
        let Some(path) = &self.path else {
            debug!("watermark store is in-memory only; skipping persist");
            return;
        };
        if let Err(err) = storage::write_json_atomic(path, snapshot).await {
            warn!(error = %err, "failed to persist watermarks");
        }
    }
}
