//! Remote quote collection
//!
//! The remote is a placeholder posts API: GET returns items with a `title`
//! field, POST accepts a post object and echoes it back. Only titles are
//! used; every fetched item becomes a quote in the server category.

use std::future::Future;
use std::time::Duration;

use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::SyncError;
use crate::config::Config;
use crate::models::Quote;

/// Longest title kept verbatim; longer titles are cut and marked with "..."
pub const MAX_TITLE_CHARS: usize = 50;

/// A remote collection quotes are synced with
pub trait RemoteSource {
    /// Fetch at most `limit` quotes
    fn fetch_quotes(&self, limit: usize)
        -> impl Future<Output = Result<Vec<Quote>, SyncError>> + Send;

    /// Send quotes to the remote, returning how many were accepted
    fn push_quotes(&self, quotes: &[Quote])
        -> impl Future<Output = Result<usize, SyncError>> + Send;
}

/// Item returned by the remote collection
#[derive(Debug, Clone, Deserialize)]
struct RemoteItem {
    title: String,
}

/// Item sent to the remote collection
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemotePost {
    pub id: usize,
    pub title: String,
    pub body: String,
    pub user_id: u32,
}

impl RemotePost {
    /// Wire form of the quote at `position` in the pushed sample
    pub fn from_quote(position: usize, quote: &Quote) -> Self {
        Self {
            id: position + 1,
            title: quote.text.clone(),
            body: format!("Category: {}", quote.category),
            user_id: 1,
        }
    }
}

/// Turn a remote title into quote text
pub fn title_to_text(title: &str) -> String {
    let title = title.trim();
    if title.chars().count() > MAX_TITLE_CHARS {
        let cut: String = title.chars().take(MAX_TITLE_CHARS).collect();
        format!("{}...", cut)
    } else {
        title.to_string()
    }
}

/// HTTP remote backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    url: String,
    category: String,
}

impl HttpRemote {
    /// Create a remote for `url`, tagging fetched quotes with `category`
    pub fn new(
        url: impl Into<String>,
        category: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("quotes/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            category: category.into(),
        })
    }

    /// Create a remote from configuration
    pub fn from_config(config: &Config) -> Result<Self, SyncError> {
        Self::new(
            config.sync_url.clone(),
            config.server_category.clone(),
            config.sync_timeout(),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post(&self, post: RemotePost) -> Result<(), SyncError> {
        let response = self
            .client
            .post(&self.url)
            .json(&post)
            .send()
            .await
            .map_err(|e| SyncError::from_reqwest(e, &self.url))?
            .error_for_status()
            .map_err(|e| SyncError::from_reqwest(e, &self.url))?;

        // Echoed post is read but not merged back
        let _echo: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SyncError::from_reqwest(e, &self.url))?;
        Ok(())
    }
}

impl RemoteSource for HttpRemote {
    async fn fetch_quotes(&self, limit: usize) -> Result<Vec<Quote>, SyncError> {
        debug!(url = %self.url, limit, "fetching remote quotes");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| SyncError::from_reqwest(e, &self.url))?
            .error_for_status()
            .map_err(|e| SyncError::from_reqwest(e, &self.url))?;

        let items: Vec<RemoteItem> = response
            .json()
            .await
            .map_err(|e| SyncError::from_reqwest(e, &self.url))?;

        Ok(items
            .into_iter()
            .take(limit)
            .filter_map(|item| Quote::new(title_to_text(&item.title), &self.category).ok())
            .collect())
    }

    async fn push_quotes(&self, quotes: &[Quote]) -> Result<usize, SyncError> {
        debug!(url = %self.url, count = quotes.len(), "pushing local quotes");

        let posts = quotes
            .iter()
            .enumerate()
            .map(|(position, quote)| self.post(RemotePost::from_quote(position, quote)));
        let results = try_join_all(posts).await?;
        Ok(results.len())
    }
}
