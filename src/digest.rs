//! Digest assembly: topic grouping, recency timeline and signal scoring.

use crate::types::{Digest, DigestQuote, Story};
use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;
use tracing::info;

/// Number of most-recent stories kept in the timeline.
pub const TIMELINE_LEN: usize = 8;

/// The fixed editorial quote carried on every digest.
pub fn default_quote() -> DigestQuote {
    DigestQuote {
        text: "AI shifts economic power when paired with viable business models.".to_string(),
        author: "Editorial Team".to_string(),
    }
}

/// Assemble the daily digest from deduplicated stories.
///
/// Every story in `timeline` and every topic bucket entry also appears in
/// `stories`; a story with N topics lands in N buckets, appended in
/// first-seen order. `signal_score` stays in [1, 5] even for an empty run.
pub fn assemble(stories: Vec<Story>, target_date: NaiveDate) -> Digest {
    let mut topics: BTreeMap<String, Vec<Story>> = BTreeMap::new();
    for story in &stories {
        for topic in &story.topics {
            topics.entry(topic.clone()).or_default().push(story.clone());
        }
    }

    // Stable sort keeps input order for equal timestamps.
    let mut timeline = stories.clone();
    timeline.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    timeline.truncate(TIMELINE_LEN);

    let signal_score = signal_score(&stories);

    info!(
        stories = stories.len(),
        topics = topics.len(),
        signal_score,
        %target_date,
        "Assembled digest"
    );

    Digest {
        date: target_date,
        generated_at: Utc::now(),
        stories,
        topics,
        timeline,
        quote: default_quote(),
        signal_score,
    }
}

/// Aggregate confidence: round(mean relevance * 5) clamped to [1, 5]. An
/// empty story list has mean 0 and clamps up to 1, never 0. Ties round to
/// even, so a mean of exactly 0.5 scores 2.
fn signal_score(stories: &[Story]) -> u8 {
    let count = stories.len().max(1) as f64;
    let mean = stories.iter().map(|s| s.relevance).sum::<f64>() / count;
    (mean * 5.0).round_ties_even().clamp(1.0, 5.0) as u8
}
