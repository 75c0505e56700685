//! Link previews: bounded-timeout page fetch with two-tier caching

pub mod cache;
pub mod fetch;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub use cache::{PreviewCache, RedisTier, RemoteTier};

/// Extracted page metadata; ephemeral, lives only in the cache tiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedPreview {
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub url: String,
    pub domain: String,
    pub stored_at: DateTime<Utc>,
}

/// Preview lookups: cache first, fetch on miss, repopulate on refresh
pub struct PreviewService {
    client: Client,
    cache: PreviewCache,
}

impl PreviewService {
    pub fn new(client: Client, cache: PreviewCache) -> Self {
        Self { client, cache }
    }

    /// `refresh` bypasses both cache tiers and forces recomputation
    pub async fn get(&self, url: &str, refresh: bool) -> Result<CachedPreview, AppError> {
        // validate before touching any tier so a bad URL is a client error
        // even on a would-be cache hit
        fetch::parse_target(url)?;

        if !refresh {
            if let Some(hit) = self.cache.get(url).await {
                return Ok(hit);
            }
        }

        let preview = fetch::fetch_preview(&self.client, url).await?;
        self.cache.set(url, &preview).await;
        Ok(preview)
    }
}
