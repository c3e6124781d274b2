use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chat identity of a subscriber as issued by the messaging platform.
pub type ChatId = i64;

/// Independent news track. Feeds, watermarks and subscriber modes are
/// partitioned by category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[serde(alias = "kz")]
    Regional,
    #[default]
    #[serde(alias = "world")]
    Global,
}

impl Category {
    /// Processing order of a poll cycle.
    pub const ALL: [Category; 2] = [Category::Regional, Category::Global];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Regional => "regional",
            Category::Global => "global",
        }
    }

    /// Name used by resource files written before the categories were renamed.
    pub fn legacy_name(&self) -> &'static str {
        match self {
            Category::Regional => "kz",
            Category::Global => "world",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category `{0}`")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "regional" | "kz" => Ok(Category::Regional),
            "global" | "world" => Ok(Category::Global),
            _ => Err(UnknownCategory(s.to_owned())),
        }
    }
}

/// One item of a parsed feed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    /// Published time, else updated time, else the Unix epoch.
    pub timestamp: DateTime<Utc>,
}

impl FeedEntry {
    pub fn from_rss_item(item: &rss::Item) -> Self {
        let published = item.pub_date().and_then(parse_date);
        let updated = item
            .dublin_core_ext()
            .and_then(|dc| dc.dates().first().map(String::as_str))
            .and_then(parse_date);

        Self {
            title: item.title().map(ToOwned::to_owned),
            link: item.link().map(ToOwned::to_owned),
            description: item.description().map(ToOwned::to_owned),
            timestamp: published.or(updated).unwrap_or_default(),
        }
    }

    pub fn from_atom_entry(entry: &atom_syndication::Entry) -> Self {
        let published = entry.published().map(|dt| dt.with_timezone(&Utc));
        let updated = entry.updated().with_timezone(&Utc);
        // Atom requires <updated>; a missing element parses as the epoch.
        let updated = (updated != DateTime::<Utc>::default()).then_some(updated);

        let description = entry
            .summary()
            .map(|text| text.value.clone())
            .or_else(|| entry.content().and_then(|c| c.value().map(ToOwned::to_owned)));

        Self {
            title: Some(entry.title().value.clone()).filter(|t| !t.is_empty()),
            link: entry.links().first().map(|l| l.href().to_owned()),
            description,
            timestamp: published.or(updated).unwrap_or_default(),
        }
    }
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Title and link of an article as delivered to subscribers and recorded
/// as the latest article of a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
}

impl Article {
    pub const UNTITLED: &'static str = "Untitled";

    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }

    pub fn from_entry(entry: &FeedEntry) -> Self {
        Self {
            title: entry
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(Self::UNTITLED)
                .to_owned(),
            url: entry.link.clone().unwrap_or_default(),
        }
    }
}
