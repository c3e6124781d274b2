use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::feed::Category;
use crate::filter::RelevanceFilter;
use crate::storage;

/// Feed URLs per category and the relevance keywords.
///
/// A directory-backed catalog re-reads its files on every call so edits to
/// `<category>_feeds.json` or `keywords.json` apply from the next cycle.
#[derive(Debug, Clone)]
pub enum FeedCatalog {
    Fixed {
        feeds: HashMap<Category, Vec<String>>,
        keywords: Vec<String>,
    },
    Dir(PathBuf),
}

impl FeedCatalog {
    pub fn fixed(feeds: HashMap<Category, Vec<String>>, keywords: Vec<String>) -> Self {
        FeedCatalog::Fixed { feeds, keywords }
    }

    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        FeedCatalog::Dir(dir.as_ref().to_path_buf())
    }

    pub async fn feeds(&self, category: Category) -> Vec<String> {
        let urls = match self {
            FeedCatalog::Fixed { feeds, .. } => feeds.get(&category).cloned().unwrap_or_default(),
            FeedCatalog::Dir(dir) => {
                let path = dir.join(format!("{}_feeds.json", category.as_str()));
                let legacy = dir.join(format!("{}_feeds.json", category.legacy_name()));
                match storage::read_json::<Vec<String>>(&path).await {
                    Ok(urls) => urls,
                    Err(err) if legacy.exists() => {
                        debug!(error = %err, "using legacy feed list");
                        storage::read_json_or_default(&legacy).await
                    }
                    Err(err) => {
                        warn!(error = %err, %category, "feed list unavailable");
                        Vec::new()
                    }
                }
            }
        };
        dedup_valid(urls)
    }

    pub async fn relevance_filter(&self) -> RelevanceFilter {
        match self {
            FeedCatalog::Fixed { keywords, .. } => RelevanceFilter::new(keywords),
            FeedCatalog::Dir(dir) => {
                let path = dir.join("keywords.json");
                match storage::read_json::<Vec<String>>(&path).await {
                    Ok(keywords) => RelevanceFilter::new(keywords),
                    Err(err) => {
                        warn!(error = %err, "keyword list unavailable, nothing will match");
                        RelevanceFilter::default()
                    }
                }
            }
        }
    }
}

/// Drops duplicates and entries that are not absolute http(s) URLs,
/// keeping list order.
fn dedup_valid(urls: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(urls.len());
    for raw in urls {
        let trimmed = raw.trim();
        match url::Url::parse(trimmed) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                if !out.iter().any(|u| u == trimmed) {
                    out.push(trimmed.to_owned());
                }
            }
            _ => warn!(url = %raw, "ignoring invalid feed URL"),
        }
    }
    out
}
