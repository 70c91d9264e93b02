//! In-memory TTL cache backend. Production deploys point the trait at
//! Redis; tests and single-process deployments use this.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::{CacheBackend, CacheError, CacheResult};

struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> CacheResult<std::sync::MutexGuard<'_, HashMap<String, Entry>>> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Backend("cache mutex poisoned".into()))
    }
}

impl CacheBackend for MemoryCache {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                // Expired: an entry must never be served past its TTL.
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut entries = self.lock()?;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> CacheResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn delete_prefix(&self, prefix: &str) -> CacheResult<usize> {
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|k, _| !k.starts_with(prefix));
        Ok(before - entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_delete() {
        let cache = MemoryCache::new();
        cache.set("k1", "v1", Duration::from_secs(60)).unwrap();
        assert_eq!(cache.get("k1").unwrap(), Some("v1".to_string()));
        cache.delete("k1").unwrap();
        assert_eq!(cache.get("k1").unwrap(), None);
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let cache = MemoryCache::new();
        cache.set("k1", "v1", Duration::from_millis(10)).unwrap();
        std::thread::sleep(Duration::from_millis(25));
        assert_eq!(cache.get("k1").unwrap(), None);
    }

    #[test]
    fn test_set_refreshes_value_and_ttl() {
        let cache = MemoryCache::new();
        cache.set("k1", "old", Duration::from_millis(10)).unwrap();
        cache.set("k1", "new", Duration::from_secs(60)).unwrap();
        std::thread::sleep(Duration::from_millis(25));
        assert_eq!(cache.get("k1").unwrap(), Some("new".to_string()));
    }

    #[test]
    fn test_delete_prefix_counts() {
        let cache = MemoryCache::new();
        cache.set("topics:u1", "a", Duration::from_secs(60)).unwrap();
        cache.set("topic_messages:u1:t1", "b", Duration::from_secs(60)).unwrap();
        cache.set("topic_messages:u1:t2", "c", Duration::from_secs(60)).unwrap();
        cache.set("topic_messages:u2:t1", "d", Duration::from_secs(60)).unwrap();
        let n = cache.delete_prefix("topic_messages:u1:").unwrap();
        assert_eq!(n, 2);
        assert!(cache.get("topic_messages:u2:t1").unwrap().is_some());
    }
}
