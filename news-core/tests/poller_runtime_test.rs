mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::{day, entry, Harness, RecordingChat, StubSource};
use news_core::{spawn_poller, Category, DeliveryPolicy, FeedCatalog};

#[tokio::test]
async fn spawn_poller_runs_first_cycle_immediately() {
    let source = Arc::new(StubSource::default());
    source.set(
        "http://feeds.example/w",
        vec![entry("seed", "http://w/0", day(2024, 1, 1))],
    );
    let catalog = FeedCatalog::fixed(
        HashMap::from([(Category::Global, vec!["http://feeds.example/w".to_string()])]),
        vec![],
    );
    let h = Harness::new(
        source,
        Arc::new(RecordingChat::default()),
        catalog,
        DeliveryPolicy::FailFast,
    );

    // Interval far longer than the test: only the eager first run can set it.
    let handle = spawn_poller(h.cycle.clone(), Duration::from_secs(3600));

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while h.watermarks.get(Category::Global).await.is_none() {
        assert!(tokio::time::Instant::now() < deadline, "first cycle did not run");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(h.watermarks.get(Category::Global).await, Some(day(2024, 1, 1)));

    handle.stop().await.expect("stop poller");
}

#[tokio::test]
async fn stop_waits_for_requested_cycle() {
    let source = Arc::new(StubSource::default());
    source.set(
        "http://feeds.example/w",
        vec![entry("seed", "http://w/0", day(2024, 1, 1))],
    );
    let catalog = FeedCatalog::fixed(
        HashMap::from([(Category::Global, vec!["http://feeds.example/w".to_string()])]),
        vec!["crash".to_string()],
    );
    let h = Harness::new(
        source.clone(),
        Arc::new(RecordingChat::default()),
        catalog,
        DeliveryPolicy::FailFast,
    );
    h.registry.ensure_mode(1).await;
    h.registry.add(1).await;

    let handle = spawn_poller(h.cycle.clone(), Duration::from_secs(3600));
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while h.watermarks.get(Category::Global).await.is_none() {
        assert!(tokio::time::Instant::now() < deadline, "first cycle did not run");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    source.set(
        "http://feeds.example/w",
        vec![entry("Train crash", "http://w/1", day(2024, 1, 2))],
    );
    let trigger = handle.trigger();
    assert!(trigger.request());
    handle.stop().await.expect("stop poller");

    // The requested sweep finished its fan-out before the poller exited.
    assert_eq!(h.chat.recipients(), vec![1]);
    assert_eq!(h.watermarks.get(Category::Global).await, Some(day(2024, 1, 2)));
    assert!(!trigger.request(), "poller is gone");
}
