//! Engine configuration — serde structs with per-field defaults.
//!
//! Values are owned by the embedding application's config loader; this
//! module only defines the shape, the defaults, and an env-variable
//! override path (TOPIC_SIMILARITY_THRESHOLD, MAX_TOPIC_KEYWORDS,
//! CACHE_TTL, CACHE_ENABLED) matching the deployed backend's names.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::{TopicError, TopicResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum cosine similarity for joining an existing topic.
    pub similarity_threshold: f64,
    /// Keywords kept per topic (top-K by TF-IDF weight).
    pub max_topic_keywords: usize,
    /// Cache TTL in seconds.
    pub cache_ttl_secs: u64,
    /// false routes every read straight to the stores.
    pub cache_enabled: bool,
    /// Max attempts per store operation (>= 1).
    pub max_store_retries: u32,
    /// Worker threads consuming the assignment queue.
    pub queue_workers: usize,
    /// Max buffered assignment jobs.
    pub queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_topic_keywords: DEFAULT_MAX_TOPIC_KEYWORDS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            cache_enabled: true,
            max_store_retries: DEFAULT_MAX_STORE_RETRIES,
            queue_workers: DEFAULT_QUEUE_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by environment variables where present.
    /// Unparseable values keep the default (logged, not fatal).
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(v) = env_parse::<f64>("TOPIC_SIMILARITY_THRESHOLD") {
            cfg.similarity_threshold = v;
        }
        if let Some(v) = env_parse::<usize>("MAX_TOPIC_KEYWORDS") {
            cfg.max_topic_keywords = v;
        }
        if let Some(v) = env_parse::<u64>("CACHE_TTL") {
            cfg.cache_ttl_secs = v;
        }
        if let Ok(v) = std::env::var("CACHE_ENABLED") {
            match v.to_lowercase().as_str() {
                "1" | "true" | "yes" => cfg.cache_enabled = true,
                "0" | "false" | "no" => cfg.cache_enabled = false,
                other => {
                    tracing::warn!(value = %other, "Unparseable CACHE_ENABLED, keeping default");
                }
            }
        }
        cfg
    }

    pub fn validate(&self) -> TopicResult<()> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(TopicError::InvalidInput(format!(
                "similarity_threshold must be in [0,1], got {}",
                self.similarity_threshold
            )));
        }
        if self.max_topic_keywords == 0 {
            return Err(TopicError::InvalidInput(
                "max_topic_keywords must be >= 1".into(),
            ));
        }
        if self.max_store_retries == 0 {
            return Err(TopicError::InvalidInput(
                "max_store_retries must be >= 1".into(),
            ));
        }
        if self.queue_workers == 0 || self.queue_capacity == 0 {
            return Err(TopicError::InvalidInput(
                "queue_workers and queue_capacity must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "Unparseable env override, keeping default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.similarity_threshold, 0.3);
        assert_eq!(cfg.max_topic_keywords, 5);
        assert_eq!(cfg.cache_ttl_secs, 300);
        assert!(cfg.cache_enabled);
        assert_eq!(cfg.max_store_retries, 3);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("TOPIC_SIMILARITY_THRESHOLD", "0.55");
        std::env::set_var("CACHE_ENABLED", "false");
        let cfg = EngineConfig::from_env();
        assert_eq!(cfg.similarity_threshold, 0.55);
        assert!(!cfg.cache_enabled);
        std::env::remove_var("TOPIC_SIMILARITY_THRESHOLD");
        std::env::remove_var("CACHE_ENABLED");
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let cfg = EngineConfig {
            similarity_threshold: 1.5,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_serde_partial_json() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{"max_topic_keywords": 8}"#).unwrap();
        assert_eq!(cfg.max_topic_keywords, 8);
        assert_eq!(cfg.cache_ttl_secs, 300);
    }
}
