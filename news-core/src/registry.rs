use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::feed::{Category, ChatId};
use crate::storage;

#[derive(Debug, Default)]
struct RegistryData {
    subscribers: BTreeSet<ChatId>,
    modes: BTreeMap<ChatId, Category>,
}

/// Subscribed chats and the category each of them follows.
///
/// Cloning yields another handle to the same state, so the command handlers
/// and the poll task observe each other's changes immediately.
#[derive(Debug, Clone)]
pub struct SubscriberRegistry {
    inner: Arc<RwLock<RegistryData>>,
    users_path: Option<PathBuf>,
    modes_path: Option<PathBuf>,
}

impl SubscriberRegistry {
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(RwLock::new(RegistryData::default())),
            users_path: None,
            modes_path: None,
        }
    }

    /// Loads `users.json` and `user_mode.json` from `dir`. Missing or
    /// unreadable files yield an empty registry.
    pub async fn load_from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let users_path = dir.join("users.json");
        let modes_path = dir.join("user_mode.json");

        let subscribers: BTreeSet<ChatId> = storage::read_json_or_default(&users_path).await;
        let modes: BTreeMap<ChatId, Category> = storage::read_json_or_default(&modes_path).await;
        info!(
            subscribers = subscribers.len(),
            modes = modes.len(),
            "subscriber registry loaded"
        );

        Self {
            inner: Arc::new(RwLock::new(RegistryData { subscribers, modes })),
            users_path: Some(users_path),
            modes_path: Some(modes_path),
        }
    }

    /// Returns `false` if the chat was already subscribed.
    pub async fn add(&self, id: ChatId) -> bool {
        let mut inner = self.inner.write().await;
        let added = inner.subscribers.insert(id);
        if added {
            self.persist_users(&inner).await;
        }
        added
    }

    /// Returns `false` if the chat was not subscribed; nothing is written then.
    pub async fn remove(&self, id: ChatId) -> bool {
        let mut inner = self.inner.write().await;
        let removed = inner.subscribers.remove(&id);
        if removed {
            self.persist_users(&inner).await;
        }
        removed
    }

    pub async fn contains(&self, id: ChatId) -> bool {
        self.inner.read().await.subscribers.contains(&id)
    }

    pub async fn all(&self) -> BTreeSet<ChatId> {
        self.inner.read().await.subscribers.clone()
    }

    pub async fn mode_of(&self, id: ChatId) -> Option<Category> {
        self.inner.read().await.modes.get(&id).copied()
    }

    pub async fn set_mode(&self, id: ChatId, category: Category) {
        let mut inner = self.inner.write().await;
        let previous = inner.modes.insert(id, category);
        if previous != Some(category) {
            self.persist_modes(&inner).await;
        } else {
            debug!(chat_id = id, %category, "mode unchanged");
        }
    }

    /// Mode of `id`, assigning the default category when none was chosen.
    pub async fn ensure_mode(&self, id: ChatId) -> Category {
        let mut inner = self.inner.write().await;
        if let Some(mode) = inner.modes.get(&id) {
            return *mode;
        }
        let mode = Category::default();
        inner.modes.insert(id, mode);
        self.persist_modes(&inner).await;
        mode
    }

    /// Subscribed chats whose mode is `category`, in ascending id order.
    pub async fn recipients(&self, category: Category) -> Vec<ChatId> {
        let inner = self.inner.read().await;
        inner
            .modes
            .iter()
            .filter(|(id, mode)| **mode == category && inner.subscribers.contains(*id))
            .map(|(id, _)| *id)
            .collect()
    }

    // Callers hold the write guard across the write, so files are replaced
    // in the same order as the in-memory state changes.
    async fn persist_users(&self, data: &RegistryData) {
        let Some(path) = &self.users_path else {
            return;
        };
        if let Err(err) = storage::write_json_atomic(path, &data.subscribers).await {
            warn!(error = %err, "failed to persist subscribers");
        }
    }

    async fn persist_modes(&self, data: &RegistryData) {
        let Some(path) = &self.modes_path else {
            return;
        };
        if let Err(err) = storage::write_json_atomic(path, &data.modes).await {
            warn!(error = %err, "failed to persist user modes");
        }
    }
}
