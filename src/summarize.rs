//! Best-effort story summarization through an ordered fallback cascade.
//!
//! Strategies are tried in order; the first non-empty result wins and every
//! failure degrades silently to the next strategy. The extractor never
//! returns an error to the caller.

use crate::fetcher::Fetch;
use crate::html;
use crate::types::{truncate_chars, Result, SUMMARY_MAX_CHARS};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Full-article extraction result: the raw article text plus an optional
/// natural-language summary of it.
#[derive(Debug, Clone)]
pub struct ExtractedArticle {
    pub text: String,
    pub summary: Option<String>,
}

/// Optional capability: download an article and reduce it to text and summary.
/// Absence of the capability (a `None` slot in [`SummaryExtractor`]) is the
/// documented "unavailable" signal; the cascade then skips this strategy.
#[async_trait]
pub trait ArticleExtract: Send + Sync {
    async fn extract(&self, url: &str) -> Result<ExtractedArticle>;
}

/// Default article extractor: fetch on the auxiliary timeout, pull the main
/// content out of the page, and summarize it as the leading sentences.
pub struct LeadSentenceExtractor {
    fetcher: Arc<dyn Fetch>,
    sentences: usize,
}

impl LeadSentenceExtractor {
    pub fn new(fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            fetcher,
            sentences: 3,
        }
    }
}

#[async_trait]
impl ArticleExtract for LeadSentenceExtractor {
    async fn extract(&self, url: &str) -> Result<ExtractedArticle> {
        let page = self.fetcher.fetch_aux(url).await?;
        let text = html::main_content(&page.body).unwrap_or_default();
        let summary = lead_sentences(&text, self.sentences);
        Ok(ExtractedArticle {
            text,
            summary: if summary.is_empty() {
                None
            } else {
                Some(summary)
            },
        })
    }
}

/// The summary cascade. Holds the optional article-extraction capability and
/// a fetcher for the readability-style second strategy.
pub struct SummaryExtractor {
    fetcher: Arc<dyn Fetch>,
    article: Option<Arc<dyn ArticleExtract>>,
}

impl SummaryExtractor {
    pub fn new(fetcher: Arc<dyn Fetch>, article: Option<Arc<dyn ArticleExtract>>) -> Self {
        Self { fetcher, article }
    }

    /// Cascade with the default article extractor installed.
    pub fn with_defaults(fetcher: Arc<dyn Fetch>) -> Self {
        let article = Arc::new(LeadSentenceExtractor::new(fetcher.clone()));
        Self::new(fetcher, Some(article))
    }

    /// Produce a summary for `url`, falling back to `fallback` (typically the
    /// anchor's visible text) when every extraction strategy comes up empty.
    /// Always truncated to [`SUMMARY_MAX_CHARS`] characters; non-empty
    /// whenever `fallback` is non-empty.
    pub async fn summarize(&self, url: &str, fallback: &str) -> String {
        if let Some(summary) = self.try_article(url).await {
            return truncate_chars(&summary, SUMMARY_MAX_CHARS);
        }
        if let Some(summary) = self.try_readability(url).await {
            return truncate_chars(&summary, SUMMARY_MAX_CHARS);
        }
        truncate_chars(fallback.trim(), SUMMARY_MAX_CHARS)
    }

    /// Strategy 1: full-article extraction; summarizer output preferred, raw
    /// article text when the summarizer yields nothing.
    async fn try_article(&self, url: &str) -> Option<String> {
        let extractor = self.article.as_ref()?;
        match extractor.extract(url).await {
            Ok(article) => {
                let text = article
                    .summary
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or(article.text);
                let text = text.trim().to_string();
                if text.is_empty() {
                    None
                } else {
                    Some(text)
                }
            }
            Err(e) => {
                debug!(%url, error = %e, "Article extraction failed, falling through");
                None
            }
        }
    }

    /// Strategy 2: readability-style main-content extraction from the page.
    async fn try_readability(&self, url: &str) -> Option<String> {
        match self.fetcher.fetch(url).await {
            Ok(page) => html::main_content(&page.body).filter(|text| !text.trim().is_empty()),
            Err(e) => {
                debug!(%url, error = %e, "Readability extraction failed, falling through");
                None
            }
        }
    }
}

/// First `count` sentences of a text, naive split on periods.
pub fn lead_sentences(text: &str, count: usize) -> String {
    let sentences: Vec<&str> = text
        .split('.')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .take(count)
        .collect();
    if sentences.is_empty() {
        String::new()
    } else {
        format!("{}.", sentences.join(". "))
    }
}
