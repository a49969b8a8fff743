use crate::html;
use crate::types::{DigestError, Result};
use chrono::{DateTime, Utc};
use feed_rs::parser;
use tracing::debug;

/// A feed entry reduced to the fields the story normalizer needs.
#[derive(Debug, Clone)]
pub struct ParsedEntry {
    pub title: String,
    pub url: String,
    /// Entry summary reduced to plain text (feed summaries are often HTML).
    pub summary: String,
    /// Published timestamp, falling back to the updated timestamp. `None`
    /// when the feed carries neither; the normalizer stamps "now".
    pub published_at: Option<DateTime<Utc>>,
}

/// Parse a feed document and return at most `limit` entries in feed order.
/// Entries without a link are skipped; a story needs a URL to dedupe on.
pub fn parse_entries(content: &str, limit: usize) -> Result<Vec<ParsedEntry>> {
    let feed = parser::parse(content.as_bytes())
        .map_err(|e| DigestError::FeedParse(format!("failed to parse feed: {e}")))?;

    let mut entries = Vec::new();
    for entry in feed.entries.into_iter().take(limit) {
        let url = match entry.links.first() {
            Some(link) => link.href.clone(),
            None => {
                debug!(id = %entry.id, "Skipping feed entry without a link");
                continue;
            }
        };

        let title = entry
            .title
            .map(|t| t.content)
            .unwrap_or_else(|| "Untitled".to_string());

        let summary = entry
            .summary
            .map(|s| html::plain_text(&s.content))
            .unwrap_or_default();

        let published_at = entry
            .published
            .or(entry.updated)
            .map(|dt| dt.with_timezone(&Utc));

        entries.push(ParsedEntry {
            title,
            url,
            summary,
            published_at,
        });
    }

    debug!(count = entries.len(), "Parsed feed entries");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rss(items: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Test Feed</title>{items}</channel></rss>"#
        )
    }

    #[test]
    fn parses_basic_rss_items() {
        let content = rss(
            r#"<item>
                <title>AI policy shift</title>
                <link>https://example.com/policy</link>
                <description>&lt;p&gt;Summary &lt;b&gt;with markup&lt;/b&gt;&lt;/p&gt;</description>
                <pubDate>Wed, 01 May 2024 10:00:00 GMT</pubDate>
            </item>"#,
        );
        let entries = parse_entries(&content, 10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "AI policy shift");
        assert_eq!(entries[0].summary, "Summary with markup");
        assert!(entries[0].published_at.is_some());
    }

    #[test]
    fn caps_at_limit() {
        let items: String = (0..15)
            .map(|i| {
                format!(
                    "<item><title>t{i}</title><link>https://example.com/{i}</link></item>"
                )
            })
            .collect();
        let entries = parse_entries(&rss(&items), 10).unwrap();
        assert_eq!(entries.len(), 10);
    }

    #[test]
    fn skips_entries_without_links() {
        let content = rss("<item><title>no link here</title></item>");
        let entries = parse_entries(&content, 10).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn rejects_non_feed_content() {
        assert!(parse_entries("<html><body>nope</body></html>", 10).is_err());
    }
}
