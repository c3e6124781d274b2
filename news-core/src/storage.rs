//! JSON file persistence shared by the subscriber, mode, latest-article and
//! watermark stores.
//!
//! Writes go through `<name>.json.tmp` followed by a rename. Reads fall back
//! to that temp file when the main file is corrupted, and to the type's
//! default when neither can be parsed.

use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::error::StorageError;

pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads `path`, trying the temp file on corruption, and defaults on failure.
pub async fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match read_json(path).await {
        Ok(value) => value,
        Err(StorageError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "store file not found, using defaults");
            T::default()
        }
        Err(err) => {
            warn!(error = %err, "failed to read store, trying tmp fallback");
            let tmp = tmp_path(path);
            match read_json(&tmp).await {
                Ok(value) => value,
                Err(_) => T::default(),
            }
        }
    }
}

pub async fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, &bytes)
        .await
        .map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn tmp_path(path: &Path) -> std::path::PathBuf {
    path.with_extension("json.tmp")
}
