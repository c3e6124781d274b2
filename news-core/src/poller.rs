use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::catalog::FeedCatalog;
use crate::delivery::{DeliveryFanout, DeliveryReport};
use crate::error::PollError;
use crate::feed::{Article, Category};
use crate::render;
use crate::selector;
use crate::source::FeedSource;
use crate::watermark::WatermarkStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub feeds_checked: usize,
    pub fetch_failures: usize,
    /// Entries newer than their category watermark.
    pub new_entries: usize,
    /// New entries dropped by the keyword filter.
    pub irrelevant: usize,
    pub dispatches: Vec<(Category, Article, DeliveryReport)>,
}

/// One sweep over every category and feed: fetch, pick the new entry,
/// filter it and fan it out.
pub struct PollCycle {
    source: Arc<dyn FeedSource>,
    catalog: FeedCatalog,
    watermarks: WatermarkStore,
    fanout: DeliveryFanout,
    running: Mutex<()>,
}

impl PollCycle {
    pub fn new(
        source: Arc<dyn FeedSource>,
        catalog: FeedCatalog,
        watermarks: WatermarkStore,
        fanout: DeliveryFanout,
    ) -> Self {
        Self {
            source,
            catalog,
            watermarks,
            fanout,
            running: Mutex::new(()),
        }
    }

    pub fn fanout(&self) -> &DeliveryFanout {
        &self.fanout
    }

    /// Runs a full sweep. A failing feed never stops the others. Concurrent
    /// callers wait for the sweep in progress instead of overlapping it.
    pub async fn run_once(&self) -> CycleReport {
        let _guard = self.running.lock().await;
        let filter = self.catalog.relevance_filter().await;
        let mut report = CycleReport::default();
        let mut claimed: HashSet<String> = HashSet::new();

        for category in Category::ALL {
            let feeds = self.catalog.feeds(category).await;
            debug!(%category, feeds = feeds.len(), "checking category");

            for (index, url) in feeds.iter().enumerate() {
                if !claimed.insert(url.clone()) {
                    warn!(feed = %url, %category, "feed already listed under another category, skipping");
                    continue;
                }
                report.feeds_checked += 1;

                let entries = match self.source.fetch(url).await {
                    Ok(entries) => entries,
                    Err(err) => {
                        report.fetch_failures += 1;
                        warn!(feed = %url, error = %err, "failed to fetch feed");
                        continue;
                    }
                };

                let Some(entry) = selector::select(&entries, category, &self.watermarks).await
                else {
                    debug!(feed = %url, position = index + 1, %category, "nothing new");
                    continue;
                };
                report.new_entries += 1;

                if !filter.is_relevant(&render::relevance_text(&entry)) {
                    report.irrelevant += 1;
                    debug!(feed = %url, title = ?entry.title, "entry not relevant");
                    continue;
                }

                let article = Article::from_entry(&entry);
                let delivery = self.fanout.dispatch(category, &article).await;
                report.dispatches.push((category, article, delivery));
            }
        }

        info!(
            feeds = report.feeds_checked,
            failures = report.fetch_failures,
            new = report.new_entries,
            dispatched = report.dispatches.len(),
            "poll cycle finished"
        );
        report
    }
}

/// Requests an extra sweep from a running poller.
#[derive(Debug, Clone)]
pub struct CycleTrigger(mpsc::Sender<()>);

impl CycleTrigger {
    /// Queues a sweep; a request already pending absorbs this one. Returns
    /// `false` once the poller has stopped.
    pub fn request(&self) -> bool {
        !matches!(self.0.try_send(()), Err(mpsc::error::TrySendError::Closed(_)))
    }
}

pub struct PollerHandle {
    cancel_tx: broadcast::Sender<()>,
    trigger_tx: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl PollerHandle {
    pub fn trigger(&self) -> CycleTrigger {
        CycleTrigger(self.trigger_tx.clone())
    }

    /// Stops the poller after the sweep in progress, if any, completes.
    /// Pending manual requests are served before the stop takes effect.
    pub async fn stop(self) -> Result<(), PollError> {
        let _ = self.cancel_tx.send(());
        self.join.await.map_err(PollError::from)
    }
}

/// Runs `cycle` immediately and then every `interval` until stopped, plus
/// once per request made through [`PollerHandle::trigger`].
pub fn spawn_poller(cycle: Arc<PollCycle>, interval: Duration) -> PollerHandle {
    let (cancel_tx, mut cancel_rx) = broadcast::channel(1);
    let (trigger_tx, mut trigger_rx) = mpsc::channel(1);
    let join = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                Some(()) = trigger_rx.recv() => {
                    info!("running requested poll cycle");
                    cycle.run_once().await;
                }
                _ = cancel_rx.recv() => {
                    info!("poller shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    cycle.run_once().await;
                }
            }
        }
    });

    PollerHandle {
        cancel_tx,
        trigger_tx,
        join,
    }
}
