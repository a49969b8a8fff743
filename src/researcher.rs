//! The researcher agent: evaluates baseline sources, applies reviewer
//! feedback to the catalog and records a weekly feedback request.

use crate::catalog::Catalog;
use crate::storage::FeedbackStore;
use crate::types::{
    DigestError, FeedbackAction, FeedbackRequest, FeedbackResponse, IngestionType, Result,
    SourceMetadata, SourcePatch,
};
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Minimum days between feedback requests.
const FEEDBACK_REQUEST_INTERVAL_DAYS: i64 = 7;

/// Baseline source list, used to (re)seed the catalog.
pub fn default_sources() -> Vec<SourceMetadata> {
    vec![
        SourceMetadata {
            source_id: "ft_ai".to_string(),
            name: "Financial Times • AI".to_string(),
            url: "https://www.ft.com/stream/5285b972-7c50-4e4a-b833-1b7eea195df3".to_string(),
            ingestion_type: IngestionType::Html,
            credibility_score: 0.92,
            visitor_score: 0.9,
            business_alignment: 0.95,
            topics: vec![
                "business".to_string(),
                "markets".to_string(),
                "policy".to_string(),
            ],
            cadence: "daily".to_string(),
            last_checked: None,
        },
        SourceMetadata {
            source_id: "reuters_ai".to_string(),
            name: "Reuters • AI".to_string(),
            url: "https://www.reuters.com/technology/artificial-intelligence/".to_string(),
            ingestion_type: IngestionType::Html,
            credibility_score: 0.95,
            visitor_score: 0.94,
            business_alignment: 0.9,
            topics: vec!["markets".to_string(), "policy".to_string()],
            cadence: "daily".to_string(),
            last_checked: None,
        },
        SourceMetadata {
            source_id: "a16z_ai".to_string(),
            name: "a16z • AI + business".to_string(),
            url: "https://feeds.simplecast.com/tOjNXec5".to_string(),
            ingestion_type: IngestionType::Feed,
            credibility_score: 0.7,
            visitor_score: 0.7,
            business_alignment: 0.85,
            topics: vec!["business".to_string(), "society".to_string()],
            cadence: "weekly".to_string(),
            last_checked: None,
        },
        SourceMetadata {
            source_id: "mit_techreview_ai".to_string(),
            name: "MIT Tech Review • AI".to_string(),
            url: "https://www.technologyreview.com/topic/artificial-intelligence/feed/"
                .to_string(),
            ingestion_type: IngestionType::Feed,
            credibility_score: 0.88,
            visitor_score: 0.83,
            business_alignment: 0.82,
            topics: vec!["policy".to_string(), "society".to_string()],
            cadence: "daily".to_string(),
            last_checked: None,
        },
    ]
}

pub struct ResearcherAgent {
    catalog: Arc<dyn Catalog>,
    feedback: FeedbackStore,
    minimum_score: f64,
}

impl ResearcherAgent {
    pub fn new(catalog: Arc<dyn Catalog>, feedback: FeedbackStore, minimum_score: f64) -> Self {
        Self {
            catalog,
            feedback,
            minimum_score,
        }
    }

    /// Full researcher pass: normalize baselines, fold in queued and injected
    /// feedback, upsert the catalog and ask for the next round of feedback.
    pub async fn run(&self, injected: Vec<FeedbackResponse>) -> Result<usize> {
        info!("Starting researcher run");
        let sources = self.normalize_sources(default_sources());

        let mut responses = self.feedback.consume_responses().await?;
        responses.extend(injected);

        let expanded = self.apply_feedback(sources, &responses);
        self.catalog.upsert_sources(&expanded).await?;
        self.request_feedback().await?;

        info!(count = expanded.len(), "Researcher run complete");
        Ok(expanded.len())
    }

    /// Keep baseline sources whose aggregate score clears the floor.
    pub fn normalize_sources(&self, baseline: Vec<SourceMetadata>) -> Vec<SourceMetadata> {
        baseline
            .into_iter()
            .filter(|source| {
                let aggregate = (source.credibility_score
                    + source.visitor_score
                    + source.business_alignment)
                    / 3.0;
                if aggregate < self.minimum_score {
                    warn!(name = %source.name, aggregate, "Skipping low-scoring source");
                    false
                } else {
                    true
                }
            })
            .collect()
    }

    /// Apply reviewer responses to the source set. Invalid payloads skip the
    /// response with a warning; they never corrupt the catalog.
    pub fn apply_feedback(
        &self,
        sources: Vec<SourceMetadata>,
        responses: &[FeedbackResponse],
    ) -> Vec<SourceMetadata> {
        if responses.is_empty() {
            return sources;
        }

        let mut order: Vec<String> = sources.iter().map(|s| s.source_id.clone()).collect();
        let mut by_id: HashMap<String, SourceMetadata> = sources
            .into_iter()
            .map(|s| (s.source_id.clone(), s))
            .collect();

        for response in responses {
            info!(action = ?response.action, source_id = ?response.source_id, "Applying feedback");
            if let Err(e) = apply_response(&mut by_id, &mut order, response) {
                warn!(error = %e, "Skipping malformed feedback response");
            }
        }

        order
            .into_iter()
            .filter_map(|id| by_id.remove(&id))
            .collect()
    }

    /// Append a feedback request, at most once per week.
    pub async fn request_feedback(&self) -> Result<()> {
        let mut queue = self.feedback.load().await?;
        let now = Utc::now();

        if let Some(last) = queue.last_request_iso {
            if now - last < Duration::days(FEEDBACK_REQUEST_INTERVAL_DAYS) {
                info!("Feedback already requested within the last week");
                return Ok(());
            }
        }

        queue.requests.push(FeedbackRequest {
            requested_at: now,
            notes: "Please review AI source coverage and suggest business policy additions."
                .to_string(),
        });
        queue.last_request_iso = Some(now);
        self.feedback.save(&queue).await
    }
}

fn apply_response(
    by_id: &mut HashMap<String, SourceMetadata>,
    order: &mut Vec<String>,
    response: &FeedbackResponse,
) -> Result<()> {
    match response.action {
        FeedbackAction::Remove => {
            if let Some(id) = &response.source_id {
                if by_id.remove(id).is_some() {
                    order.retain(|existing| existing != id);
                }
            }
            Ok(())
        }
        FeedbackAction::Adjust => {
            let id = response
                .source_id
                .as_ref()
                .ok_or_else(|| DigestError::InvalidFeedback("adjust without source_id".into()))?;
            let source = match by_id.get_mut(id) {
                Some(source) => source,
                None => return Ok(()),
            };
            let patch: SourcePatch =
                serde_json::from_value(serde_json::Value::Object(response.payload.clone()))
                    .map_err(|e| DigestError::InvalidFeedback(e.to_string()))?;
            patch.apply(source);
            Ok(())
        }
        FeedbackAction::Add => {
            let mut payload = response.payload.clone();
            let source_id = payload
                .get("source_id")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .or_else(|| response.source_id.clone())
                .or_else(|| {
                    payload
                        .get("name")
                        .and_then(|v| v.as_str())
                        .map(slugify_name)
                });
            let source_id = source_id
                .ok_or_else(|| DigestError::InvalidFeedback("add without identity".into()))?;
            payload.insert(
                "source_id".to_string(),
                serde_json::Value::String(source_id.clone()),
            );

            let source: SourceMetadata =
                serde_json::from_value(serde_json::Value::Object(payload))
                    .map_err(|e| DigestError::InvalidFeedback(e.to_string()))?;

            if by_id.insert(source_id.clone(), source).is_none() {
                order.push(source_id);
            }
            Ok(())
        }
    }
}

/// Lowercase alphanumerics, everything else collapsed to underscores.
pub fn slugify_name(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() {
                ch.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = slug.trim_matches('_');
    if trimmed.is_empty() {
        "source".to_string()
    } else {
        trimmed.to_string()
    }
}
