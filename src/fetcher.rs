use crate::types::{DigestError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Raw response from a page or feed fetch.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub body: String,
    pub status: u16,
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    /// Timeout for source page and feed fetches.
    pub page_timeout_secs: u64,
    /// Timeout for auxiliary lookups (article downloads during summarization).
    pub aux_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "newswire-digest/0.1".to_string(),
            page_timeout_secs: 20,
            aux_timeout_secs: 10,
        }
    }
}

/// Blocking-style content retrieval seam. The pipeline awaits each call before
/// issuing the next one; tests substitute an in-memory implementation.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch a source page or feed document. Non-success status is an error.
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;

    /// Fetch an article during summarization, on the shorter auxiliary timeout.
    async fn fetch_aux(&self, url: &str) -> Result<FetchedPage>;
}

/// HTTP fetcher backed by reqwest. One client per timeout class. No retries:
/// a failed fetch is terminal for the source until the next scheduled run.
pub struct HttpFetcher {
    page_client: Client,
    aux_client: Client,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let page_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.page_timeout_secs))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;
        let aux_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.aux_timeout_secs))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            page_client,
            aux_client,
        })
    }

    async fn get(client: &Client, url: &str) -> Result<FetchedPage> {
        debug!(%url, "Fetching");
        let response = client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() && !status.is_redirection() {
            return Err(DigestError::Fetch {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response.text().await?;
        debug!(%url, bytes = body.len(), "Fetched");

        Ok(FetchedPage {
            body,
            status: status.as_u16(),
            headers,
        })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        Self::get(&self.page_client, url).await
    }

    async fn fetch_aux(&self, url: &str) -> Result<FetchedPage> {
        Self::get(&self.aux_client, url).await
    }
}
