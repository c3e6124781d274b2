use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::FetchError;
use crate::feed::FeedEntry;

/// Retrieves one feed document and turns it into entries. Entry order is
/// not significant.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedEntry>, FetchError>;
}

/// Fetches feeds over HTTP and parses RSS 2.0 or Atom bodies.
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    client: Client,
    request_timeout: Duration,
}

impl HttpFeedSource {
    pub fn new(client: Client, request_timeout: Duration) -> Self {
        Self {
            client,
            request_timeout,
        }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedEntry>, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }
        let bytes = response.bytes().await?;
        parse_feed(&bytes)
    }
}

/// Parses an RSS 2.0 channel, falling back to an Atom feed.
pub fn parse_feed(body: &[u8]) -> Result<Vec<FeedEntry>, FetchError> {
    match rss::Channel::read_from(body) {
        Ok(channel) => Ok(channel.items().iter().map(FeedEntry::from_rss_item).collect()),
        Err(rss_err) => match atom_syndication::Feed::read_from(body) {
            Ok(feed) => Ok(feed.entries().iter().map(FeedEntry::from_atom_entry).collect()),
            Err(atom_err) => {
                debug!(error = %atom_err, "body is not an Atom feed either");
                Err(FetchError::Parse(rss_err))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_atom_when_rss_fails() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example</title>
  <id>urn:example</id>
  <updated>2024-01-03T10:00:00Z</updated>
  <entry>
    <title>Atom entry</title>
    <id>urn:example:1</id>
    <link href="https://example.com/atom/1"/>
    <updated>2024-01-03T10:00:00Z</updated>
    <published>2024-01-02T09:00:00Z</published>
    <summary>Summary text</summary>
  </entry>
</feed>"#;
        let entries = parse_feed(atom.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title.as_deref(), Some("Atom entry"));
        assert_eq!(entries[0].link.as_deref(), Some("https://example.com/atom/1"));
        assert_eq!(entries[0].description.as_deref(), Some("Summary text"));
        assert_eq!(entries[0].timestamp.to_rfc3339(), "2024-01-02T09:00:00+00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_feed(b"<html><body>nope</body></html>"),
            Err(FetchError::Parse(_))
        ));
    }
}
