use tracing::{debug, info};

use crate::feed::{Category, FeedEntry};
use crate::watermark::{Observation, WatermarkStore};

/// Newest entry by timestamp. On ties the first one encountered wins.
pub fn newest_entry(entries: &[FeedEntry]) -> Option<&FeedEntry> {
    entries.iter().fold(None, |best: Option<&FeedEntry>, entry| match best {
        Some(current) if entry.timestamp <= current.timestamp => Some(current),
        _ => Some(entry),
    })
}

/// Picks the newest entry of a feed if it is strictly newer than the
/// category watermark, advancing the watermark when it is.
///
/// The first observation of a category only records the watermark and
/// selects nothing, so a fresh start does not replay the feed backlog.
/// Entries without any date sit at the epoch and are never selected once a
/// real watermark exists.
pub async fn select(
    entries: &[FeedEntry],
    category: Category,
    watermarks: &WatermarkStore,
) -> Option<FeedEntry> {
    let latest = newest_entry(entries)?;

    match watermarks.observe(category, latest.timestamp).await {
        Observation::WarmUp => {
            info!(%category, watermark = %latest.timestamp, "watermark initialised, backlog suppressed");
            None
        }
        Observation::Advanced { previous } => {
            debug!(%category, %previous, latest = %latest.timestamp, "new entry found");
            Some(latest.clone())
        }
        Observation::Stale { watermark } => {
            debug!(%category, latest = %latest.timestamp, %watermark, "no news available");
            None
        }
    }
}
