use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::DeliveryError;
use crate::feed::{Article, Category, ChatId};
use crate::latest::LatestArticleStore;
use crate::registry::SubscriberRegistry;
use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    #[default]
    Html,
    Markdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SendOptions {
    pub parse_mode: Option<ParseMode>,
    pub disable_link_preview: bool,
}

impl SendOptions {
    pub fn html() -> Self {
        Self {
            parse_mode: Some(ParseMode::Html),
            disable_link_preview: false,
        }
    }
}

/// Outbound side of the messaging platform.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn send(
        &self,
        chat_id: ChatId,
        text: &str,
        options: &SendOptions,
    ) -> Result<(), DeliveryError>;
}

/// What happens to the remaining recipients after a send fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Stop at the first failure; later recipients are skipped.
    #[default]
    FailFast,
    /// Attempt every recipient regardless of earlier failures.
    Independent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: Vec<ChatId>,
    pub failed: Vec<(ChatId, String)>,
    pub skipped: Vec<ChatId>,
}

impl DeliveryReport {
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

/// Sends confirmed articles to every subscriber following their category.
#[derive(Clone)]
pub struct DeliveryFanout {
    chat: Arc<dyn ChatClient>,
    registry: SubscriberRegistry,
    latest: LatestArticleStore,
    policy: DeliveryPolicy,
}

impl DeliveryFanout {
    pub fn new(
        chat: Arc<dyn ChatClient>,
        registry: SubscriberRegistry,
        latest: LatestArticleStore,
        policy: DeliveryPolicy,
    ) -> Self {
        Self {
            chat,
            registry,
            latest,
            policy,
        }
    }

    /// Delivers `article` to the subscribers whose mode is `category`.
    ///
    /// The category's latest article is recorded once, before the first
    /// send, and only when there is at least one recipient.
    pub async fn dispatch(&self, category: Category, article: &Article) -> DeliveryReport {
        let recipients = self.registry.recipients(category).await;
        let mut report = DeliveryReport::default();
        if recipients.is_empty() {
            info!(%category, title = %article.title, "no subscribers for category");
            return report;
        }

        self.latest.set(category, article.clone()).await;

        let message = render::article_message(article);
        let options = SendOptions::html();
        let mut remaining = recipients.into_iter();
        while let Some(chat_id) = remaining.next() {
            match self.chat.send(chat_id, &message, &options).await {
                Ok(()) => report.delivered.push(chat_id),
                Err(err) => {
                    warn!(chat_id, error = %err, "failed to deliver article");
                    report.failed.push((chat_id, err.to_string()));
                    if self.policy == DeliveryPolicy::FailFast {
                        report.skipped.extend(remaining.by_ref());
                        break;
                    }
                }
            }
        }

        if report.is_complete() {
            info!(%category, title = %article.title, recipients = report.delivered.len(), "article sent");
        } else {
            error!(
                %category,
                title = %article.title,
                delivered = report.delivered.len(),
                failed = report.failed.len(),
                skipped = report.skipped.len(),
                "article did not reach every subscriber"
            );
        }
        report
    }
}

/// Sends `text` to every subscriber, whatever their mode. Failures are
/// logged and do not stop the broadcast.
pub async fn broadcast_notice(
    chat: &dyn ChatClient,
    registry: &SubscriberRegistry,
    text: &str,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    let options = SendOptions::html();
    for chat_id in registry.all().await {
        match chat.send(chat_id, text, &options).await {
            Ok(()) => report.delivered.push(chat_id),
            Err(err) => {
                warn!(chat_id, error = %err, "failed to send notice");
                report.failed.push((chat_id, err.to_string()));
            }
        }
    }
    report
}
