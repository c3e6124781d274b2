//! Entry points behind the user and admin chat commands.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::delivery::DeliveryReport;
use crate::feed::{Article, Category, ChatId, UnknownCategory};
use crate::latest::LatestArticleStore;
use crate::poller::{CycleReport, CycleTrigger, PollCycle};
use crate::registry::SubscriberRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started { mode: Category },
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    AlreadyStopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub category: Category,
    pub article: Article,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishParseError {
    /// Fewer than a category, one title word and a URL.
    #[error("usage: <category> <title...> <url>")]
    TooFewArguments,
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategory),
    #[error("invalid URL `{0}`")]
    InvalidUrl(String),
}

/// Parses `<category> <title words...> <url>`.
pub fn parse_publish_args(args: &str) -> Result<PublishRequest, PublishParseError> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    let [category, title @ .., url] = parts.as_slice() else {
        return Err(PublishParseError::TooFewArguments);
    };
    if title.is_empty() {
        return Err(PublishParseError::TooFewArguments);
    }
    let category = category.parse::<Category>()?;
    match url::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
        _ => return Err(PublishParseError::InvalidUrl((*url).to_owned())),
    }
    Ok(PublishRequest {
        category,
        article: Article::new(title.join(" "), *url),
    })
}

/// Core operations invoked by the chat front end. Shares its stores with
/// the poll task.
#[derive(Clone)]
pub struct BotCore {
    registry: SubscriberRegistry,
    latest: LatestArticleStore,
    cycle: Arc<PollCycle>,
    trigger: Option<CycleTrigger>,
}

/// What became of a manual refresh request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Handed to the background poller.
    Queued,
    /// No running poller; the sweep ran inline.
    Completed(CycleReport),
}

impl BotCore {
    pub fn new(
        registry: SubscriberRegistry,
        latest: LatestArticleStore,
        cycle: Arc<PollCycle>,
    ) -> Self {
        Self {
            registry,
            latest,
            cycle,
            trigger: None,
        }
    }

    /// Routes manual refreshes through a running poller, so shutdown waits
    /// for them like any scheduled sweep.
    pub fn with_trigger(mut self, trigger: CycleTrigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Subscribes `id`, giving it the default mode if it never chose one.
    pub async fn start_subscription(&self, id: ChatId) -> StartOutcome {
        let mode = self.registry.ensure_mode(id).await;
        if self.registry.add(id).await {
            info!(chat_id = id, %mode, "new subscriber");
            StartOutcome::Started { mode }
        } else {
            StartOutcome::AlreadyRunning
        }
    }

    pub async fn stop_subscription(&self, id: ChatId) -> StopOutcome {
        if self.registry.remove(id).await {
            info!(chat_id = id, "subscriber removed");
            StopOutcome::Stopped
        } else {
            StopOutcome::AlreadyStopped
        }
    }

    pub async fn select_mode(&self, id: ChatId, category: Category) {
        self.registry.set_mode(id, category).await;
        info!(chat_id = id, %category, "mode selected");
    }

    /// Latest article of the caller's category. Works for unsubscribed chats.
    pub async fn latest_article(&self, id: ChatId) -> (Category, Option<Article>) {
        let mode = self.registry.mode_of(id).await.unwrap_or_default();
        (mode, self.latest.get(mode).await)
    }

    pub async fn trigger_cycle(&self) -> CycleReport {
        info!("poll cycle triggered manually");
        self.cycle.run_once().await
    }

    /// Asks for a sweep without waiting for it when a poller is attached.
    pub async fn request_refresh(&self) -> RefreshOutcome {
        match &self.trigger {
            Some(trigger) if trigger.request() => RefreshOutcome::Queued,
            _ => RefreshOutcome::Completed(self.trigger_cycle().await),
        }
    }

    /// Sends a hand-picked article to the category's subscribers, bypassing
    /// the watermark and the keyword filter.
    pub async fn publish_article(&self, request: &PublishRequest) -> DeliveryReport {
        info!(category = %request.category, title = %request.article.title, "publishing article manually");
        self.cycle
            .fanout()
            .dispatch(request.category, &request.article)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multi_word_title() {
        let req = parse_publish_args("world Big storm hits coast https://news.example/1").unwrap();
        assert_eq!(req.category, Category::Global);
        assert_eq!(req.article, Article::new("Big storm hits coast", "https://news.example/1"));
    }

    #[test]
    fn rejects_missing_title_or_url() {
        assert_eq!(
            parse_publish_args("regional https://news.example/1"),
            Err(PublishParseError::TooFewArguments)
        );
        assert_eq!(parse_publish_args(""), Err(PublishParseError::TooFewArguments));
        assert!(matches!(
            parse_publish_args("regional Title not-a-url"),
            Err(PublishParseError::InvalidUrl(_))
        ));
        assert!(matches!(
            parse_publish_args("local Title https://news.example/1"),
            Err(PublishParseError::UnknownCategory(_))
        ));
    }

    #[test]
    fn parse_errors_render_readable_messages() {
        assert_eq!(
            PublishParseError::TooFewArguments.to_string(),
            "usage: <category> <title...> <url>"
        );
        let err = parse_publish_args("local Title https://news.example/1").unwrap_err();
        assert_eq!(err.to_string(), "unknown category `local`");
        assert_eq!(
            PublishParseError::InvalidUrl("ftp://x".into()).to_string(),
            "invalid URL `ftp://x`"
        );
    }
}
