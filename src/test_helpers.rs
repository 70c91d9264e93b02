//! Shared test utilities — builders and engine factories.
//!
//! Available only under `#[cfg(test)]`.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::TopicCache;
use crate::config::EngineConfig;
use crate::engine::assignment::AssignmentEngine;
use crate::message::{Message, MessageRole};
use crate::storage::{MemoryStore, MessageStore};
use crate::topic::Topic;
use crate::{id_gen, time_utils};

// ============================================================================
// Builders
// ============================================================================

pub struct MessageBuilder {
    message: Message,
}

impl MessageBuilder {
    pub fn new(user_id: &str, text: &str) -> Self {
        Self {
            message: Message {
                id: id_gen::message_id(),
                user_id: user_id.to_string(),
                topic_id: None,
                role: MessageRole::User,
                text: text.to_string(),
                created_at: time_utils::now(),
            },
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.message.id = id.to_string();
        self
    }

    pub fn role(mut self, role: MessageRole) -> Self {
        self.message.role = role;
        self
    }

    pub fn build(self) -> Message {
        self.message
    }
}

pub struct TopicBuilder {
    topic: Topic,
}

impl TopicBuilder {
    pub fn new(user_id: &str) -> Self {
        Self {
            topic: Topic::new(user_id, "m1", vec!["test".into()]),
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.topic.id = id.to_string();
        self
    }

    pub fn keywords(mut self, keywords: &[&str]) -> Self {
        self.topic.keywords = keywords.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn build(self) -> Topic {
        self.topic
    }
}

// ============================================================================
// Engine factory
// ============================================================================

/// Engine over a shared in-memory store and cache, default config.
pub fn engine_with_store() -> (Arc<MemoryStore>, AssignmentEngine) {
    let store = Arc::new(MemoryStore::new());
    let cache = TopicCache::in_memory(Duration::from_secs(60));
    let engine = AssignmentEngine::new(
        store.clone(),
        store.clone(),
        cache,
        EngineConfig::default(),
    );
    (store, engine)
}

/// Store a fresh user message and return its id. Millisecond pause keeps
/// created_at ordering deterministic across calls.
pub fn ingest(store: &Arc<MemoryStore>, user_id: &str, text: &str) -> String {
    let message = Message::new(user_id, MessageRole::User, text).expect("valid test message");
    store.insert_message(&message).expect("insert test message");
    std::thread::sleep(Duration::from_millis(2));
    message.id
}
