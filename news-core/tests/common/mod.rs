#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use news_core::{
    ChatClient, ChatId, DeliveryError, DeliveryFanout, DeliveryPolicy, FeedCatalog, FeedEntry,
    FeedSource, FetchError, LatestArticleStore, PollCycle, SendOptions, SubscriberRegistry,
    WatermarkStore,
};

/// Chat client that records every message and fails for chosen chats.
#[derive(Default)]
pub struct RecordingChat {
    sent: Mutex<Vec<(ChatId, String)>>,
    attempts: Mutex<Vec<ChatId>>,
    failing: HashSet<ChatId>,
}

impl RecordingChat {
    pub fn failing(ids: impl IntoIterator<Item = ChatId>) -> Self {
        Self {
            failing: ids.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<(ChatId, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn recipients(&self) -> Vec<ChatId> {
        self.sent().into_iter().map(|(id, _)| id).collect()
    }

    pub fn attempts(&self) -> Vec<ChatId> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for RecordingChat {
    async fn send(
        &self,
        chat_id: ChatId,
        text: &str,
        _options: &SendOptions,
    ) -> Result<(), DeliveryError> {
        self.attempts.lock().unwrap().push(chat_id);
        if self.failing.contains(&chat_id) {
            return Err(DeliveryError::Rejected {
                chat_id,
                description: "Forbidden: bot was blocked by the user".into(),
            });
        }
        self.sent.lock().unwrap().push((chat_id, text.to_owned()));
        Ok(())
    }
}

/// Feed source serving canned entries; unknown URLs fail to fetch.
#[derive(Default)]
pub struct StubSource {
    feeds: Mutex<HashMap<String, Vec<FeedEntry>>>,
}

impl StubSource {
    pub fn set(&self, url: &str, entries: Vec<FeedEntry>) {
        self.feeds.lock().unwrap().insert(url.to_owned(), entries);
    }
}

#[async_trait]
impl FeedSource for StubSource {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedEntry>, FetchError> {
        self.feeds
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or(FetchError::Parse(rss::Error::Eof))
    }
}

pub fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

pub fn entry(title: &str, link: &str, timestamp: DateTime<Utc>) -> FeedEntry {
    FeedEntry {
        title: Some(title.to_owned()),
        link: Some(link.to_owned()),
        description: None,
        timestamp,
    }
}

pub fn temp_dir(tag: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!(
        "newsbot_{}_{}_{}",
        tag,
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    dir
}

/// In-memory pipeline wired around the given source, chat and catalog.
pub struct Harness {
    pub registry: SubscriberRegistry,
    pub latest: LatestArticleStore,
    pub watermarks: WatermarkStore,
    pub chat: Arc<RecordingChat>,
    pub cycle: Arc<PollCycle>,
}

impl Harness {
    pub fn new(
        source: Arc<dyn FeedSource>,
        chat: Arc<RecordingChat>,
        catalog: FeedCatalog,
        policy: DeliveryPolicy,
    ) -> Self {
        let registry = SubscriberRegistry::in_memory();
        let latest = LatestArticleStore::in_memory();
        let watermarks = WatermarkStore::in_memory();
        let fanout = DeliveryFanout::new(chat.clone(), registry.clone(), latest.clone(), policy);
        let cycle = Arc::new(PollCycle::new(source, catalog, watermarks.clone(), fanout));
        Self {
            registry,
            latest,
            watermarks,
            chat,
            cycle,
        }
    }
}
