//! Cache Layer — advisory read-path memoization with TTL expiry.
//!
//! Policy: the cache is never authoritative. Every read path falls back to
//! the stores on miss or backend failure; backend errors are swallowed and
//! logged, never propagated. Any write that changes a user's topic or
//! message set deletes the affected keys synchronously before the write is
//! acknowledged.

pub mod memory;

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub use memory::MemoryCache;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Narrow seam over the external key-value store (Redis in production).
pub trait CacheBackend: Send + Sync {
    fn get(&self, key: &str) -> CacheResult<Option<String>>;
    fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;
    fn delete(&self, key: &str) -> CacheResult<()>;
    /// Delete every key starting with `prefix`; returns how many.
    fn delete_prefix(&self, prefix: &str) -> CacheResult<usize>;
}

// ── Key building ──
// Deterministic functions of user_id and query shape. Prefix deletes rely
// on the trailing separator so one user id can never shadow another.

pub fn topics_key(user_id: &str) -> String {
    format!("topics:{}", user_id)
}

pub fn topic_messages_key(user_id: &str, topic_id: &str) -> String {
    format!("topic_messages:{}:{}", user_id, topic_id)
}

pub fn recent_messages_key(user_id: &str, limit: usize) -> String {
    format!("recent_messages:{}:{}", user_id, limit)
}

/// Cache manager: key building, JSON (de)serialization, TTL, and the
/// swallow-and-log error policy. `enabled = false` bypasses the backend
/// entirely with no behavioral change other than latency.
#[derive(Clone)]
pub struct TopicCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
    enabled: bool,
}

impl TopicCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration, enabled: bool) -> Self {
        Self { backend, ttl, enabled }
    }

    /// In-memory cache with the given TTL, enabled.
    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryCache::new()), ttl, true)
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.enabled {
            return None;
        }
        match self.backend.get(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    tracing::debug!(key, "Cache hit");
                    Some(value)
                }
                Err(e) => {
                    // Stale shape from an older build: drop the entry.
                    tracing::warn!(key, error = %e, "Cache entry undecodable, deleting");
                    let _ = self.backend.delete(key);
                    None
                }
            },
            Ok(None) => {
                tracing::debug!(key, "Cache miss");
                None
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache get failed, falling back to store");
                None
            }
        }
    }

    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) {
        if !self.enabled {
            return;
        }
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache serialization failed");
                return;
            }
        };
        match self.backend.set(key, &raw, self.ttl) {
            Ok(()) => tracing::debug!(key, ttl_secs = self.ttl.as_secs(), "Cache set"),
            Err(e) => tracing::warn!(key, error = %e, "Cache set failed"),
        }
    }

    pub fn invalidate(&self, key: &str) {
        if !self.enabled {
            return;
        }
        match self.backend.delete(key) {
            Ok(()) => tracing::debug!(key, "Cache invalidated"),
            Err(e) => tracing::warn!(key, error = %e, "Cache delete failed"),
        }
    }

    /// Drop every entry keyed by this user: the topic list and all
    /// per-topic / recent message lists.
    pub fn invalidate_user(&self, user_id: &str) {
        if !self.enabled {
            return;
        }
        self.invalidate(&topics_key(user_id));
        for prefix in [
            format!("topic_messages:{}:", user_id),
            format!("recent_messages:{}:", user_id),
        ] {
            match self.backend.delete_prefix(&prefix) {
                Ok(n) if n > 0 => {
                    tracing::debug!(prefix = %prefix, count = n, "Cache prefix invalidated")
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(prefix = %prefix, error = %e, "Cache prefix delete failed"),
            }
        }
    }
}
