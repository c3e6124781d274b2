use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::warn;

use crate::feed::{Article, Category};
use crate::storage;

/// Last article dispatched per category, answered by the "latest" command.
///
/// Records are written when a dispatch starts, so they describe the most
/// recent article sent out, not one confirmed delivered to everyone.
#[derive(Debug, Clone)]
pub struct LatestArticleStore {
    inner: Arc<RwLock<HashMap<Category, Article>>>,
    dir: Option<PathBuf>,
}

impl LatestArticleStore {
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            dir: None,
        }
    }

    pub async fn load_from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let mut articles = HashMap::new();
        for category in Category::ALL {
            let mut found: Option<Article> =
                storage::read_json_or_default(&Self::file_for(&dir, category)).await;
            if found.is_none() {
                let legacy = dir.join(format!("latest_{}_article.json", category.legacy_name()));
                found = storage::read_json_or_default(&legacy).await;
            }
            if let Some(article) = found {
                articles.insert(category, article);
            }
        }
        Self {
            inner: Arc::new(RwLock::new(articles)),
            dir: Some(dir),
        }
    }

    pub async fn get(&self, category: Category) -> Option<Article> {
        self.inner.read().await.get(&category).cloned()
    }

    /// Records `article` and writes it out while still holding the lock, so
    /// concurrent writers leave the file matching memory.
    pub async fn set(&self, category: Category, article: Article) {
        let mut inner = self.inner.write().await;
        inner.insert(category, article.clone());
        if let Some(dir) = &self.dir {
            let path = Self::file_for(dir, category);
            if let Err(err) = storage::write_json_atomic(&path, &article).await {
                warn!(error = %err, %category, "failed to persist latest article");
            }
        }
    }

    fn file_for(dir: &Path, category: Category) -> PathBuf {
        dir.join(format!("latest_{}_article.json", category.as_str()))
    }
}
