pub mod catalog;
pub mod commands;
pub mod config;
pub mod delivery;
pub mod error;
pub mod feed;
pub mod filter;
pub mod latest;
pub mod poller;
pub mod registry;
pub mod render;
pub mod selector;
pub mod source;
pub mod storage;
pub mod watermark;

pub use catalog::FeedCatalog;
pub use commands::{
    parse_publish_args, BotCore, PublishRequest, RefreshOutcome, StartOutcome, StopOutcome,
};
pub use config::BotConfig;
pub use delivery::{
    broadcast_notice, ChatClient, DeliveryFanout, DeliveryPolicy, DeliveryReport, ParseMode,
    SendOptions,
};
pub use error::{ConfigError, DeliveryError, FetchError, PollError, StorageError};
pub use feed::{Article, Category, ChatId, FeedEntry};
pub use filter::RelevanceFilter;
pub use latest::LatestArticleStore;
pub use poller::{spawn_poller, CycleReport, CycleTrigger, PollCycle, PollerHandle};
pub use registry::SubscriberRegistry;
pub use source::{parse_feed, FeedSource, HttpFeedSource};
pub use watermark::{Observation, WatermarkStore};
