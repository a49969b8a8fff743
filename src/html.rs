//! HTML helpers shared by the scraping path and the summary cascade.
//!
//! `scraper::Html` is not `Send`, so every function here parses, extracts and
//! returns owned data synchronously; callers never hold a parsed document
//! across an await point.

use scraper::{Html, Selector};

/// An anchor candidate scraped from a source page.
#[derive(Debug, Clone)]
pub struct Anchor {
    pub href: String,
    pub text: String,
}

/// Reduce an HTML fragment (e.g. a feed entry summary) to plain text with
/// normalized whitespace.
pub fn plain_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    normalize_whitespace(&text)
}

/// Collect all anchors with an href attribute from a page, in document order.
/// Visible text is whitespace-normalized; filtering happens in the caller.
pub fn extract_anchors(html: &str) -> Vec<Anchor> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").unwrap();

    document
        .select(&selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?.trim().to_string();
            let text = normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "));
            Some(Anchor { href, text })
        })
        .collect()
}

/// Readability-style main-content extraction: prefer `<article>` text, fall
/// back to the joined paragraph text of the page. Returns `None` when neither
/// yields anything.
pub fn main_content(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let article_selector = Selector::parse("article").unwrap();
    for element in document.select(&article_selector) {
        let text = normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "));
        if !text.is_empty() {
            return Some(text);
        }
    }

    let p_selector = Selector::parse("p").unwrap();
    let paragraphs = document
        .select(&p_selector)
        .map(|element| normalize_whitespace(&element.text().collect::<Vec<_>>().join(" ")))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>();

    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join(" "))
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_strips_tags() {
        let html = "<p>Hello <b>world</b></p><p>again</p>";
        assert_eq!(plain_text(html), "Hello world again");
    }

    #[test]
    fn extract_anchors_keeps_document_order() {
        let html = r#"<html><body>
            <a href="/a">First link with some visible text</a>
            <a href="/b">Second</a>
            <span>not a link</span>
        </body></html>"#;
        let anchors = extract_anchors(html);
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[0].href, "/a");
        assert_eq!(anchors[1].text, "Second");
    }

    #[test]
    fn main_content_prefers_article_tag() {
        let html = r#"<html><body>
            <p>navigation cruft</p>
            <article>The real story body.</article>
        </body></html>"#;
        assert_eq!(main_content(html).as_deref(), Some("The real story body."));
    }

    #[test]
    fn main_content_falls_back_to_paragraphs() {
        let html = "<html><body><p>One.</p><p>Two.</p></body></html>";
        assert_eq!(main_content(html).as_deref(), Some("One. Two."));
    }

    #[test]
    fn main_content_empty_page_is_none() {
        assert_eq!(main_content("<html><body><div></div></body></html>"), None);
    }
}
