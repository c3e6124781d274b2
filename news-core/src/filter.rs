/// Case-insensitive keyword matcher over rendered article text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelevanceFilter {
    keywords: Vec<String>,
}

impl RelevanceFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// True when any keyword occurs in `text`. An empty keyword set matches
    /// nothing.
    pub fn is_relevant(&self, text: &str) -> bool {
        let normalized = text.to_lowercase();
        self.keywords.iter().any(|k| normalized.contains(k.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_any_keyword_ignoring_case() {
        let filter = RelevanceFilter::new(["дтп", "Plane Crash"]);
        assert!(filter.is_relevant("Серьёзное ДТП на трассе"));
        assert!(filter.is_relevant("Report: plane crash near airport"));
        assert!(!filter.is_relevant("Weather forecast for tomorrow"));
    }

    #[test]
    fn blank_keywords_are_ignored() {
        let filter = RelevanceFilter::new(["", "   "]);
        assert!(filter.keywords().is_empty());
        assert!(!filter.is_relevant("anything at all"));
    }
}
