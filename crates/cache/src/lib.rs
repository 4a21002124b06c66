//! Read-through caching for computed performance payloads.
//!
//! The store itself is payload-agnostic: it holds JSON strings under
//! composite string keys with a TTL. [`get_or_compute`] layers the
//! read-through contract on top, and [`filter_key`] makes key components
//! deterministic regardless of the order filters arrive in. A cache that
//! cannot produce a usable payload (missing, expired, undecodable) never
//! fails a request; the caller's compute path runs instead.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry {
    body: String,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<String, CacheEntry>,
    default_ttl: Duration,
}

impl CacheInner {
    fn new(default_ttl: Duration) -> Self {
        Self {
            map: HashMap::new(),
            default_ttl,
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).and_then(|entry| {
            if Instant::now() <= entry.expires_at {
                Some(entry.body.clone())
            } else {
                None
            }
        })
    }

    fn put(&mut self, key: String, body: String) {
        let expires_at = Instant::now() + self.default_ttl;
        self.map.insert(key, CacheEntry { body, expires_at });
    }

    fn clear_expired(&mut self) {
        let now = Instant::now();
        self.map.retain(|_, entry| entry.expires_at > now);
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

/// Thread-safe in-memory cache for computed result payloads.
#[derive(Debug, Clone)]
pub struct CacheStore {
    inner: Arc<tokio::sync::RwLock<CacheInner>>,
}

impl CacheStore {
    /// Create a new cache store with a default TTL.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner::new(default_ttl))),
        }
    }

    /// Create a disabled cache: every read misses and writes are dropped.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Get a cached payload for the given key if it exists and hasn't expired.
    pub async fn get(&self, key: &str) -> Option<String> {
        let store = self.inner.read().await;
        store.get(key)
    }

    /// Store a payload under the given key with the default TTL.
    ///
    /// Writes are idempotent for a given key: concurrent misses recompute the
    /// same value and the last write wins. If the cache is disabled (TTL is
    /// ZERO), this is a no-op.
    pub async fn put(&self, key: String, body: String) {
        let mut store = self.inner.write().await;
        if store.default_ttl == Duration::ZERO {
            return;
        }
        store.put(key, body);
    }

    /// Remove expired entries from the cache.
    pub async fn clear_expired(&self) {
        let mut store = self.inner.write().await;
        store.clear_expired();
    }

    /// Spawns a background task that sweeps expired entries on a fixed
    /// interval.
    ///
    /// `get` skips expired entries but leaves them resident, and keys embed
    /// caller-supplied filter components, so without a sweep the map holds
    /// one dead entry per distinct key ever requested. `interval` must be
    /// non-zero.
    pub fn spawn_maintenance(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                store.clear_expired().await;
            }
        })
    }

    /// Get the number of entries in the cache (including expired entries).
    pub async fn len(&self) -> usize {
        let store = self.inner.read().await;
        store.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Read-through wrapper: returns the cached value for `key` when a usable one
/// exists, otherwise invokes `compute`, stores the result, and returns it.
///
/// The stored payload is treated as immutable; there is no partial caching of
/// intermediate steps. A payload that fails to decode counts as a miss, so a
/// degraded cache degrades to direct computation rather than to a failed
/// request.
pub async fn get_or_compute<T, E, F, Fut>(cache: &CacheStore, key: &str, compute: F) -> Result<T, E>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if let Some(body) = cache.get(key).await {
        match serde_json::from_str(&body) {
            Ok(value) => {
                tracing::debug!(key, "cache hit");
                return Ok(value);
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding undecodable cache payload");
            }
        }
    }

    let value = compute().await?;
    match serde_json::to_string(&value) {
        Ok(body) => cache.put(key.to_string(), body).await,
        Err(e) => tracing::warn!(key, error = %e, "skipping cache write for unserializable value"),
    }
    Ok(value)
}

/// Collapses a filter value list into one deterministic key component:
/// sorted, deduplicated, joined with `+`, and `all` for the unrestricted
/// (empty) case. Two logically identical filter sets produce byte-identical
/// components regardless of their original ordering.
pub fn filter_key(values: &[String]) -> String {
    let mut parts: Vec<&str> = values.iter().map(String::as_str).collect();
    parts.sort_unstable();
    parts.dedup();
    if parts.is_empty() {
        "all".to_string()
    } else {
        parts.join("+")
    }
}
