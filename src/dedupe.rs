use crate::types::Story;
use std::collections::HashMap;
use tracing::debug;

/// Strip the query string from a URL to form the deduplication key.
/// Fragments and trailing slashes are deliberately left in place.
pub fn canonical_url(url: &str) -> &str {
    match url.split_once('?') {
        Some((base, _)) => base,
        None => url,
    }
}

/// Collapse stories referring to the same underlying article. For colliding
/// canonical URLs the story with strictly greater relevance wins; ties keep
/// the first-seen story. Output order is unspecified; the assembler sorts.
pub fn dedupe(stories: Vec<Story>) -> Vec<Story> {
    let total = stories.len();
    let mut seen: HashMap<String, Story> = HashMap::new();

    for story in stories {
        let key = canonical_url(&story.url).to_string();
        match seen.get(&key) {
            Some(existing) if story.relevance <= existing.relevance => {
                debug!(url = %story.url, "Dropping lower-relevance duplicate");
            }
            _ => {
                seen.insert(key, story);
            }
        }
    }

    let unique: Vec<Story> = seen.into_values().collect();
    if unique.len() < total {
        debug!(removed = total - unique.len(), "Collapsed duplicate stories");
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn story(url: &str, relevance: f64) -> Story {
        Story {
            title: "t".to_string(),
            summary: "s".to_string(),
            url: url.to_string(),
            source_id: "src".to_string(),
            source_name: "Source".to_string(),
            published_at: Utc::now(),
            relevance,
            topics: vec![],
        }
    }

    #[test]
    fn canonical_url_strips_query_only() {
        assert_eq!(
            canonical_url("https://a.com/path?utm_source=x"),
            "https://a.com/path"
        );
        assert_eq!(
            canonical_url("https://a.com/path#frag"),
            "https://a.com/path#frag"
        );
        assert_eq!(canonical_url("https://a.com/path/"), "https://a.com/path/");
    }

    #[test]
    fn higher_relevance_wins() {
        let out = dedupe(vec![
            story("https://a.com/x?ref=1", 0.4),
            story("https://a.com/x", 0.9),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].relevance, 0.9);
    }

    #[test]
    fn ties_keep_first_seen() {
        let mut first = story("https://a.com/x", 0.5);
        first.title = "first".to_string();
        let mut second = story("https://a.com/x", 0.5);
        second.title = "second".to_string();

        let out = dedupe(vec![first, second]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "first");
    }

    #[test]
    fn distinct_urls_are_all_kept() {
        let out = dedupe(vec![
            story("https://a.com/x", 0.5),
            story("https://a.com/y", 0.5),
        ]);
        assert_eq!(out.len(), 2);
    }
}
