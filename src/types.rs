use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hard cap on story summary length, in characters.
pub const SUMMARY_MAX_CHARS: usize = 280;

/// How a source is ingested: structured syndication feed or scraped HTML page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionType {
    Feed,
    Html,
}

/// Normalized metadata for a news source. Read-only snapshot per pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub source_id: String,
    pub name: String,
    pub url: String,
    pub ingestion_type: IngestionType,
    pub credibility_score: f64,
    pub visitor_score: f64,
    pub business_alignment: f64,
    pub topics: Vec<String>,
    pub cadence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,
}

/// A typed patch against [`SourceMetadata`]. Feedback "adjust" payloads are
/// deserialized into this before being applied, so unknown fields are rejected
/// instead of silently absorbed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourcePatch {
    pub name: Option<String>,
    pub url: Option<String>,
    pub ingestion_type: Option<IngestionType>,
    pub credibility_score: Option<f64>,
    pub visitor_score: Option<f64>,
    pub business_alignment: Option<f64>,
    pub topics: Option<Vec<String>>,
    pub cadence: Option<String>,
    pub last_checked: Option<DateTime<Utc>>,
}

impl SourcePatch {
    /// Merge the patch into an existing source record.
    pub fn apply(self, source: &mut SourceMetadata) {
        if let Some(name) = self.name {
            source.name = name;
        }
        if let Some(url) = self.url {
            source.url = url;
        }
        if let Some(ingestion_type) = self.ingestion_type {
            source.ingestion_type = ingestion_type;
        }
        if let Some(score) = self.credibility_score {
            source.credibility_score = score;
        }
        if let Some(score) = self.visitor_score {
            source.visitor_score = score;
        }
        if let Some(score) = self.business_alignment {
            source.business_alignment = score;
        }
        if let Some(topics) = self.topics {
            source.topics = topics;
        }
        if let Some(cadence) = self.cadence {
            source.cadence = cadence;
        }
        if let Some(last_checked) = self.last_checked {
            source.last_checked = Some(last_checked);
        }
    }
}

/// Individual story after normalization and scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub title: String,
    pub summary: String,
    pub url: String,
    pub source_id: String,
    pub source_name: String,
    pub published_at: DateTime<Utc>,
    pub relevance: f64,
    pub topics: Vec<String>,
}

/// Fixed editorial quote carried on every digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestQuote {
    pub text: String,
    pub author: String,
}

/// The assembled daily output: deduplicated stories, topic buckets, recency
/// timeline and an aggregate signal score. Write-once, persisted as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Digest {
    pub date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub stories: Vec<Story>,
    pub topics: BTreeMap<String, Vec<Story>>,
    pub timeline: Vec<Story>,
    pub quote: DigestQuote,
    pub signal_score: u8,
}

/// Per-source ingestion state. Any failure during fetch or normalization moves
/// the source to `Failed`; the run continues with the next source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Pending,
    Fetched,
    Normalized,
    Failed,
}

/// Outcome of processing one source, kept for the run summary.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub source_id: String,
    pub state: SourceState,
    pub stories_collected: usize,
    pub error: Option<String>,
}

/// A note asking the human reviewer for catalog feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub requested_at: DateTime<Utc>,
    pub notes: String,
}

/// Feedback action kind for catalog maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackAction {
    Add,
    Remove,
    Adjust,
}

/// One reviewer response from the feedback queue. The payload is an arbitrary
/// JSON map validated against the source schema at apply time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub source_id: Option<String>,
    pub action: FeedbackAction,
    #[serde(default)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("fetch of {url} failed with status {status}")]
    Fetch { url: String, status: u16 },

    #[error("feed parse error: {0}")]
    FeedParse(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid feedback payload: {0}")]
    InvalidFeedback(String),

    #[error("setup error: {0}")]
    Setup(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DigestError>;

/// Truncate to at most `max` characters. A hard cut, no word-boundary
/// adjustment; operates on characters so multi-byte input stays valid.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_is_a_hard_character_cut() {
        assert_eq!(truncate_chars("hello world", 5), "hello");
        assert_eq!(truncate_chars("short", 280), "short");
        // Multi-byte characters count as one.
        assert_eq!(truncate_chars("héllo", 2), "hé");
    }

    #[test]
    fn source_patch_rejects_unknown_fields() {
        let raw = serde_json::json!({ "credibility_score": 0.5, "bogus": true });
        let parsed: std::result::Result<SourcePatch, _> = serde_json::from_value(raw);
        assert!(parsed.is_err());
    }

    #[test]
    fn source_patch_merges_only_present_fields() {
        let mut source = SourceMetadata {
            source_id: "s1".to_string(),
            name: "Original".to_string(),
            url: "https://example.com/feed".to_string(),
            ingestion_type: IngestionType::Feed,
            credibility_score: 0.5,
            visitor_score: 0.5,
            business_alignment: 0.5,
            topics: vec!["business".to_string()],
            cadence: "daily".to_string(),
            last_checked: None,
        };
        let patch: SourcePatch =
            serde_json::from_value(serde_json::json!({ "credibility_score": 0.9 })).unwrap();
        patch.apply(&mut source);
        assert_eq!(source.credibility_score, 0.9);
        assert_eq!(source.name, "Original");
    }
}
