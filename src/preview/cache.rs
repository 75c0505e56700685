//! Two-tier cache for fetched link previews
//!
//! A shared remote tier (redis, optional) is consulted before a bounded
//! in-process tier. Both tiers are best-effort: any cache failure degrades to
//! a miss and is logged, never surfaced to the preview request.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use deadpool_redis::{redis, Pool};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::CachedPreview;
use crate::error::AppError;

/// Keys longer than this are replaced by a fixed-length content hash
const MAX_KEY_LEN: usize = 200;

/// Remote writes above this serialized size are skipped to keep the shared
/// store from filling up with oversized entries
const MAX_REMOTE_PAYLOAD: usize = 32 * 1024;

/// Normalize a URL into a cache key: lowercase, hash when oversized
pub fn cache_key(url: &str) -> String {
    let normalized = url.trim().to_lowercase();
    if normalized.len() <= MAX_KEY_LEN {
        return format!("preview:{}", normalized);
    }
    let digest = Sha256::digest(normalized.as_bytes());
    format!("preview:sha256:{}", hex::encode(digest))
}

struct LocalEntry {
    value: CachedPreview,
    stored_at: Instant,
}

/// Bounded in-process cache with TTL and insertion-order (FIFO) eviction
pub struct LocalPreviewCache {
    inner: Mutex<LocalState>,
    ttl: Duration,
    capacity: usize,
}

struct LocalState {
    entries: HashMap<String, LocalEntry>,
    order: VecDeque<String>,
}

impl LocalPreviewCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LocalState {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Expired entries are treated as absent and purged on access
    pub fn get(&self, key: &str) -> Option<CachedPreview> {
        let mut state = self.inner.lock().expect("cache mutex poisoned");
        let expired = match state.entries.get(key) {
            Some(entry) => entry.stored_at.elapsed() >= self.ttl,
            None => return None,
        };
        if expired {
            state.entries.remove(key);
            return None;
        }
        state.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn set(&self, key: &str, value: CachedPreview) {
        let mut state = self.inner.lock().expect("cache mutex poisoned");
        let fresh = state
            .entries
            .insert(
                key.to_string(),
                LocalEntry {
                    value,
                    stored_at: Instant::now(),
                },
            )
            .is_none();
        if fresh {
            state.order.push_back(key.to_string());
        }

        // FIFO eviction, oldest insertion first; queue slots for keys that
        // were already purged are skipped
        while state.entries.len() > self.capacity {
            match state.order.pop_front() {
                Some(oldest) => {
                    state.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache mutex poisoned").entries.len()
    }
}

/// Shared remote cache tier; get/set-with-TTL by string key
#[async_trait]
pub trait RemoteTier: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CachedPreview>, AppError>;
    async fn set(&self, key: &str, payload: &str, ttl: Duration) -> Result<(), AppError>;
}

/// Redis-backed remote tier
pub struct RedisTier {
    pool: Pool,
}

impl RedisTier {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RemoteTier for RedisTier {
    async fn get(&self, key: &str) -> Result<Option<CachedPreview>, AppError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;
        let raw: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;
        match raw {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| AppError::Cache(e.to_string())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, payload: &str, ttl: Duration) -> Result<(), AppError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;
        redis::cmd("SET")
            .arg(key)
            .arg(payload)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;
        Ok(())
    }
}

/// Remote-then-local lookup with best-effort semantics on both tiers
pub struct PreviewCache {
    local: LocalPreviewCache,
    remote: Option<Box<dyn RemoteTier>>,
    ttl: Duration,
}

impl PreviewCache {
    pub fn new(ttl: Duration, capacity: usize, remote: Option<Box<dyn RemoteTier>>) -> Self {
        Self {
            local: LocalPreviewCache::new(ttl, capacity),
            remote,
            ttl,
        }
    }

    pub async fn get(&self, url: &str) -> Option<CachedPreview> {
        let key = cache_key(url);

        if let Some(remote) = &self.remote {
            match remote.get(&key).await {
                Ok(Some(hit)) => {
                    debug!("preview cache hit (remote): {}", key);
                    return Some(hit);
                }
                Ok(None) => {}
                Err(e) => warn!("remote preview cache unavailable: {}", e),
            }
        }

        let hit = self.local.get(&key);
        if hit.is_some() {
            debug!("preview cache hit (local): {}", key);
        }
        hit
    }

    /// Populate both tiers; the remote write is skipped for oversized
    /// payloads and its failures are swallowed
    pub async fn set(&self, url: &str, value: &CachedPreview) {
        let key = cache_key(url);
        self.local.set(&key, value.clone());

        let Some(remote) = &self.remote else {
            return;
        };
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("failed to serialize preview for remote cache: {}", e);
                return;
            }
        };
        if payload.len() > MAX_REMOTE_PAYLOAD {
            debug!(
                "skipping remote cache write, payload {} bytes exceeds bound",
                payload.len()
            );
            return;
        }
        if let Err(e) = remote.set(&key, &payload, self.ttl).await {
            warn!("remote preview cache write failed: {}", e);
        }
    }
}
