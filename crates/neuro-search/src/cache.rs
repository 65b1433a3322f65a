/// In-process LRU cache for search responses.
///
/// Keys embed the data fingerprint, so entries from a previous data set can
/// never be served after a reload even before `invalidate_all` runs.
use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use neuro_common::mcp_api::SearchResponse;

pub struct SearchCache {
    inner: Option<Mutex<LruCache<String, SearchResponse>>>,
}

impl SearchCache {
    /// A capacity of 0 disables caching entirely.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    pub fn get(&self, fingerprint: &str, query: &str, limit: usize) -> Option<SearchResponse> {
        let inner = self.inner.as_ref()?;
        let key = search_key(fingerprint, query, limit);
        let mut guard = inner
            .lock()
            .inspect_err(|_| warn!("search cache lock poisoned"))
            .ok()?;
        let hit = guard.get(&key).cloned();
        if hit.is_some() {
            debug!(query, limit, "search cache hit");
        }
        hit
    }

    pub fn put(&self, fingerprint: &str, query: &str, limit: usize, response: &SearchResponse) {
        let Some(inner) = self.inner.as_ref() else {
            return;
        };
        if let Ok(mut guard) = inner.lock() {
            guard.put(search_key(fingerprint, query, limit), response.clone());
        }
    }

    /// Drop every cached response. Used after a reload.
    pub fn invalidate_all(&self) {
        if let Some(Ok(mut guard)) = self.inner.as_ref().map(|m| m.lock()) {
            guard.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.inner
            .as_ref()
            .and_then(|m| m.lock().ok().map(|g| g.len()))
            .unwrap_or(0)
    }
}

/// Deterministic key: SHA-256 of `fingerprint|query|limit`.
fn search_key(fingerprint: &str, query: &str, limit: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(fingerprint.as_bytes());
    hasher.update(b"|");
    hasher.update(query.as_bytes());
    hasher.update(b"|");
    hasher.update(limit.to_string().as_bytes());
    format!("search:{:x}", hasher.finalize())
}
