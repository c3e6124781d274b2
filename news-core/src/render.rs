//! Text produced from feed entries: the plain text the relevance filter runs
//! on and the HTML message sent to subscribers.

use crate::feed::{Article, FeedEntry};

/// Longest description kept in the relevance text, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 512;

pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_owned(),
    }
}

/// `title\ndescription`, with the description truncated.
pub fn relevance_text(entry: &FeedEntry) -> String {
    let title = entry.title.as_deref().unwrap_or(Article::UNTITLED);
    let description = truncate_text(
        entry.description.as_deref().unwrap_or_default(),
        MAX_DESCRIPTION_CHARS,
    );
    format!("{title}\n{description}")
}

/// Chat message for an article, for the HTML parse mode.
pub fn article_message(article: &Article) -> String {
    format!(
        "{}\n<a href=\"{}\">🔗 Source</a>",
        escape_html(&article.title),
        escape_html(&article.url)
    )
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate_text("привет", 3), "при...");
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("exact", 5), "exact");
    }

    #[test]
    fn relevance_text_joins_title_and_description() {
        let entry = FeedEntry {
            title: None,
            link: None,
            description: Some("x".repeat(600)),
            timestamp: Utc::now(),
        };
        let text = relevance_text(&entry);
        assert!(text.starts_with("Untitled\n"));
        assert!(text.ends_with("..."));
        assert_eq!(text.chars().count(), "Untitled\n".len() + MAX_DESCRIPTION_CHARS + 3);
    }

    #[test]
    fn article_message_escapes_markup() {
        let msg = article_message(&Article::new("A <b>& B", "https://e.com/?a=1&b=2"));
        assert_eq!(
            msg,
            "A &lt;b&gt;&amp; B\n<a href=\"https://e.com/?a=1&amp;b=2\">🔗 Source</a>"
        );
    }
}
