use std::path::PathBuf;

use thiserror::Error;

use crate::feed::ChatId;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),
    #[error("feed parsing error: {0}")]
    Parse(#[from] rss::Error),
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("chat API rejected message to {chat_id}: {description}")]
    Rejected { chat_id: ChatId, description: String },
    #[error("network error while sending to {chat_id}: {source}")]
    Network {
        chat_id: ChatId,
        #[source]
        source: reqwest::Error,
    },
}

impl DeliveryError {
    pub fn chat_id(&self) -> ChatId {
        match self {
            DeliveryError::Rejected { chat_id, .. } | DeliveryError::Network { chat_id, .. } => {
                *chat_id
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required configuration `{0}` is missing")]
    Missing(&'static str),
    #[error("configuration directory could not be determined")]
    NoConfigDir,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("poller task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
