//! Digest persistence and the feedback queue file.

use crate::types::{DigestError, FeedbackRequest, FeedbackResponse, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Write one digest per run, keyed by ISO calendar date: `digest_<YYYY-MM-DD>.json`.
/// An unwritable digests directory is a fatal setup error.
pub async fn write_digest(digest: &crate::types::Digest, dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        DigestError::Setup(format!(
            "digests directory {} is not writable: {e}",
            dir.display()
        ))
    })?;

    let path = dir.join(format!("digest_{}.json", digest.date));
    let raw = serde_json::to_string_pretty(digest)?;
    tokio::fs::write(&path, raw).await.map_err(|e| {
        DigestError::Setup(format!("failed to write digest {}: {e}", path.display()))
    })?;

    info!(path = %path.display(), stories = digest.stories.len(), "Digest written");
    Ok(path)
}

/// On-disk shape of the feedback queue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackQueue {
    #[serde(default)]
    pub last_request_iso: Option<DateTime<Utc>>,
    #[serde(default)]
    pub requests: Vec<FeedbackRequest>,
    #[serde(default)]
    pub responses: Vec<FeedbackResponse>,
}

/// JSON-file backed feedback store shared by the researcher agent and the
/// human reviewer updating it out of band.
pub struct FeedbackStore {
    path: PathBuf,
}

impl FeedbackStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the queue, materializing an empty one on first touch.
    pub async fn load(&self) -> Result<FeedbackQueue> {
        if !tokio::fs::try_exists(&self.path).await? {
            let empty = FeedbackQueue::default();
            self.save(&empty).await?;
            return Ok(empty);
        }
        let raw = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub async fn save(&self, queue: &FeedbackQueue) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_string_pretty(queue)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }

    /// Drain pending reviewer responses, leaving requests intact.
    pub async fn consume_responses(&self) -> Result<Vec<FeedbackResponse>> {
        let mut queue = self.load().await?;
        let responses = std::mem::take(&mut queue.responses);
        self.save(&queue).await?;
        if !responses.is_empty() {
            info!(count = responses.len(), "Consumed feedback responses");
        }
        Ok(responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FeedbackAction;

    #[tokio::test]
    async fn load_creates_empty_queue() {
        let dir = tempfile::tempdir().unwrap();
        let store = FeedbackStore::new(dir.path().join("feedback.json"));
        let queue = store.load().await.unwrap();
        assert!(queue.responses.is_empty());
        assert!(dir.path().join("feedback.json").exists());
    }

    #[tokio::test]
    async fn consume_drains_responses() {
        let dir = tempfile::tempdir().unwrap();
        let store = FeedbackStore::new(dir.path().join("feedback.json"));

        let mut queue = store.load().await.unwrap();
        queue.responses.push(FeedbackResponse {
            submitted_at: Utc::now(),
            source_id: Some("src".to_string()),
            action: FeedbackAction::Remove,
            payload: Default::default(),
        });
        store.save(&queue).await.unwrap();

        let drained = store.consume_responses().await.unwrap();
        assert_eq!(drained.len(), 1);
        assert!(store.load().await.unwrap().responses.is_empty());
    }
}
