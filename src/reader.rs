//! The reader agent: ingestion dispatch, story normalization and the daily
//! digest run.
//!
//! Sources are processed strictly one at a time, in catalog order. A failing
//! source is logged, contributes zero stories and never aborts the run; the
//! next scheduled run is the retry mechanism.

use crate::catalog::Catalog;
use crate::dedupe::dedupe;
use crate::digest;
use crate::fetcher::Fetch;
use crate::html;
use crate::parser;
use crate::storage;
use crate::summarize::SummaryExtractor;
use crate::types::{
    truncate_chars, IngestOutcome, Result, SourceMetadata, SourceState, Story, SUMMARY_MAX_CHARS,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use url::Url;

/// Bounds on per-source story collection.
pub const MAX_FEED_ENTRIES: usize = 10;
pub const MAX_HTML_STORIES: usize = 5;
/// Anchors with shorter visible text are treated as navigation links.
pub const MIN_ANCHOR_TEXT_CHARS: usize = 40;

pub struct ReaderAgent {
    catalog: Arc<dyn Catalog>,
    fetcher: Arc<dyn Fetch>,
    summarizer: SummaryExtractor,
    digests_dir: PathBuf,
}

impl ReaderAgent {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        fetcher: Arc<dyn Fetch>,
        summarizer: SummaryExtractor,
        digests_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalog,
            fetcher,
            summarizer,
            digests_dir: digests_dir.into(),
        }
    }

    pub fn digests_dir(&self) -> &Path {
        &self.digests_dir
    }

    /// Run one digest pass for `target_date` and persist the result.
    /// Catalog and output-directory failures are fatal; everything per-source
    /// is contained.
    pub async fn run(&self, target_date: NaiveDate) -> Result<PathBuf> {
        info!(%target_date, "Starting reader run");
        let sources = self.catalog.fetch_sources().await?;

        let (stories, outcomes) = self.collect_stories(&sources).await;
        let failed = outcomes
            .iter()
            .filter(|o| o.state == SourceState::Failed)
            .count();
        info!(
            sources = sources.len(),
            failed,
            stories = stories.len(),
            "Story collection complete"
        );

        let stories = dedupe(stories);
        let digest = digest::assemble(stories, target_date);
        let path = storage::write_digest(&digest, &self.digests_dir).await?;
        info!(path = %path.display(), "Reader run complete");
        Ok(path)
    }

    /// Process every source sequentially, accumulating stories and per-source
    /// outcomes. Partial results are a valid, expected output.
    pub async fn collect_stories(
        &self,
        sources: &[SourceMetadata],
    ) -> (Vec<Story>, Vec<IngestOutcome>) {
        let mut collected = Vec::new();
        let mut outcomes = Vec::new();

        for source in sources {
            debug!(source_id = %source.source_id, state = ?SourceState::Pending, "Processing source");
            match self.ingest_source(source).await {
                Ok(stories) => {
                    debug!(
                        source_id = %source.source_id,
                        count = stories.len(),
                        state = ?SourceState::Normalized,
                        "Source normalized"
                    );
                    outcomes.push(IngestOutcome {
                        source_id: source.source_id.clone(),
                        state: SourceState::Normalized,
                        stories_collected: stories.len(),
                        error: None,
                    });
                    collected.extend(stories);
                }
                Err(e) => {
                    error!(
                        source_id = %source.source_id,
                        source_name = %source.name,
                        url = %source.url,
                        error = %e,
                        "Failed to read source"
                    );
                    outcomes.push(IngestOutcome {
                        source_id: source.source_id.clone(),
                        state: SourceState::Failed,
                        stories_collected: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        (collected, outcomes)
    }

    /// Fetch and normalize one source according to its ingestion type.
    async fn ingest_source(&self, source: &SourceMetadata) -> Result<Vec<Story>> {
        let page = self.fetcher.fetch(&source.url).await?;
        debug!(source_id = %source.source_id, state = ?SourceState::Fetched, "Source fetched");

        match source.ingestion_type {
            crate::types::IngestionType::Feed => self.normalize_feed(source, &page.body),
            crate::types::IngestionType::Html => self.scrape_html(source, &page.body).await,
        }
    }

    /// Feed path: at most the first 10 entries; missing or unparseable
    /// timestamps default to now; entry summaries arrive already reduced to
    /// plain text by the parser.
    fn normalize_feed(&self, source: &SourceMetadata, body: &str) -> Result<Vec<Story>> {
        let entries = parser::parse_entries(body, MAX_FEED_ENTRIES)?;
        let now = Utc::now();

        Ok(entries
            .into_iter()
            .map(|entry| {
                build_story(
                    &entry.title,
                    &entry.summary,
                    &entry.url,
                    entry.published_at.unwrap_or(now),
                    source,
                )
            })
            .collect())
    }

    /// HTML path: filter anchors down to story candidates, resolve relative
    /// hrefs against the source URL and run the summary cascade with the
    /// anchor text as fallback. HTML pages rarely expose reliable
    /// timestamps, so stories are stamped with the collection time.
    async fn scrape_html(&self, source: &SourceMetadata, body: &str) -> Result<Vec<Story>> {
        let base = Url::parse(&source.url)?;
        let anchors = html::extract_anchors(body);

        let mut seen_hrefs: HashSet<String> = HashSet::new();
        let mut stories = Vec::new();

        for anchor in anchors {
            if anchor.href.is_empty()
                || anchor.text.is_empty()
                || anchor.text.chars().count() < MIN_ANCHOR_TEXT_CHARS
            {
                continue;
            }
            if !seen_hrefs.insert(anchor.href.clone()) {
                continue;
            }

            let absolute_url = match resolve_url(&base, &anchor.href) {
                Ok(url) => url,
                Err(e) => {
                    warn!(href = %anchor.href, error = %e, "Skipping unresolvable anchor");
                    continue;
                }
            };

            let summary = self.summarizer.summarize(&absolute_url, &anchor.text).await;
            stories.push(build_story(
                &anchor.text,
                &summary,
                &absolute_url,
                Utc::now(),
                source,
            ));

            if stories.len() >= MAX_HTML_STORIES {
                break;
            }
        }

        Ok(stories)
    }
}

/// Normalize raw fields into a canonical [`Story`] with computed relevance.
pub fn build_story(
    title: &str,
    summary: &str,
    url: &str,
    published_at: DateTime<Utc>,
    source: &SourceMetadata,
) -> Story {
    let relevance = ((source.credibility_score + source.business_alignment) / 2.0).min(1.0);
    Story {
        title: title.to_string(),
        summary: truncate_chars(summary, SUMMARY_MAX_CHARS),
        url: url.to_string(),
        source_id: source.source_id.clone(),
        source_name: source.name.clone(),
        published_at,
        relevance,
        topics: source.topics.clone(),
    }
}

fn resolve_url(base: &Url, href: &str) -> Result<String> {
    if href.starts_with("http") {
        return Ok(href.to_string());
    }
    Ok(base.join(href).map(|u| u.to_string())?)
}
