//! Source catalog access behind an injected repository interface.
//!
//! The pipeline consumes a read-only snapshot per run; the researcher agent
//! writes through `upsert_sources`. Tests substitute [`MemoryCatalog`].

use crate::types::{DigestError, Result, SourceMetadata};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

#[async_trait]
pub trait Catalog: Send + Sync {
    /// Snapshot of all known sources, in catalog order.
    async fn fetch_sources(&self) -> Result<Vec<SourceMetadata>>;

    /// Insert or replace sources by `source_id`, preserving catalog order for
    /// existing entries and appending new ones.
    async fn upsert_sources(&self, sources: &[SourceMetadata]) -> Result<()>;
}

/// Catalog persisted as a JSON array of source records.
pub struct JsonCatalog {
    path: PathBuf,
}

impl JsonCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<SourceMetadata>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            DigestError::Setup(format!(
                "catalog {} is unreadable: {e}",
                self.path.display()
            ))
        })?;
        let sources: Vec<SourceMetadata> = serde_json::from_str(&raw)?;
        debug!(count = sources.len(), path = %self.path.display(), "Loaded catalog");
        Ok(sources)
    }

    async fn save(&self, sources: &[SourceMetadata]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_string_pretty(sources)?;
        tokio::fs::write(&self.path, raw).await?;
        info!(count = sources.len(), path = %self.path.display(), "Saved catalog");
        Ok(())
    }
}

#[async_trait]
impl Catalog for JsonCatalog {
    async fn fetch_sources(&self) -> Result<Vec<SourceMetadata>> {
        self.load().await
    }

    async fn upsert_sources(&self, sources: &[SourceMetadata]) -> Result<()> {
        let existing = match self.load().await {
            Ok(existing) => existing,
            // First write: nothing on disk yet.
            Err(DigestError::Setup(_)) => Vec::new(),
            Err(e) => return Err(e),
        };
        let merged = merge_sources(existing, sources);
        self.save(&merged).await
    }
}

/// In-memory catalog for tests and one-shot runs.
#[derive(Default)]
pub struct MemoryCatalog {
    sources: RwLock<Vec<SourceMetadata>>,
}

impl MemoryCatalog {
    pub fn new(sources: Vec<SourceMetadata>) -> Self {
        Self {
            sources: RwLock::new(sources),
        }
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn fetch_sources(&self) -> Result<Vec<SourceMetadata>> {
        Ok(self.sources.read().await.clone())
    }

    async fn upsert_sources(&self, sources: &[SourceMetadata]) -> Result<()> {
        let mut guard = self.sources.write().await;
        let merged = merge_sources(std::mem::take(&mut *guard), sources);
        *guard = merged;
        Ok(())
    }
}

fn merge_sources(existing: Vec<SourceMetadata>, updates: &[SourceMetadata]) -> Vec<SourceMetadata> {
    let mut merged = existing;
    let mut index: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, s)| (s.source_id.clone(), i))
        .collect();

    for update in updates {
        match index.get(&update.source_id) {
            Some(&i) => merged[i] = update.clone(),
            None => {
                index.insert(update.source_id.clone(), merged.len());
                merged.push(update.clone());
            }
        }
    }
    merged
}
