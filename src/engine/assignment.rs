//! Topic Assignment Engine — decides topic membership for one incoming
//! message and keeps the Topic Store consistent.
//!
//! Pass (per message):
//!   1. Load the user's topics (read-through cache).
//!   2. Corpus = [message text] + one representative text per topic.
//!   3. Vectorize, score cosine similarity message ↔ each topic.
//!   4. Best score >= threshold → join that topic (members appended,
//!      keywords recomputed, CAS update). Ties keep the earliest-created
//!      topic.
//!   5. Otherwise create a new topic with the message as sole member.
//!   6. Persist, then invalidate the user's cache keys before returning.
//!
//! Concurrency: passes for one user are serialized by a per-user lock held
//! for the whole pass; topic updates are additionally version-checked.
//! Re-running a pass for an already-assigned message is a no-op.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::cache::{self, TopicCache};
use crate::config::EngineConfig;
use crate::constants::RETRY_BACKOFF_BASE_MS;
use crate::message::Message;
use crate::storage::{MessageStore, TopicStore};
use crate::topic::Topic;
use crate::vectorize::{self, cosine_similarity, Corpus};
use crate::{TopicError, TopicResult};

/// What a completed assignment pass did.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignmentOutcome {
    /// No existing topic cleared the threshold; a new one was created.
    Created { topic_id: String },
    /// The message joined an existing topic with this similarity score.
    Joined { topic_id: String, score: f64 },
    /// The message was already assigned; the pass no-oped.
    AlreadyAssigned { topic_id: String },
}

impl AssignmentOutcome {
    pub fn topic_id(&self) -> &str {
        match self {
            Self::Created { topic_id }
            | Self::Joined { topic_id, .. }
            | Self::AlreadyAssigned { topic_id } => topic_id,
        }
    }
}

pub struct AssignmentEngine {
    topics: Arc<dyn TopicStore>,
    messages: Arc<dyn MessageStore>,
    cache: TopicCache,
    config: EngineConfig,
    /// Per-user serialization of assignment passes.
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AssignmentEngine {
    pub fn new(
        topics: Arc<dyn TopicStore>,
        messages: Arc<dyn MessageStore>,
        cache: TopicCache,
        config: EngineConfig,
    ) -> Self {
        Self {
            topics,
            messages,
            cache,
            config,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Assignment pass ──

    /// Run the assignment pass for one stored message. At-least-once safe:
    /// callers may retry on failure, and duplicate invocations no-op.
    pub fn assign_message(&self, message_id: &str) -> TopicResult<AssignmentOutcome> {
        let start = Instant::now();
        let message = self
            .with_retries("get_message", || self.messages.get_message(message_id))?
            .ok_or_else(|| TopicError::MessageNotFound(message_id.to_string()))?;

        let lock = self.user_lock(&message.user_id);
        let guard = lock.lock().unwrap_or_else(|poison| poison.into_inner());

        // Re-read under the lock: a concurrent pass may have assigned it
        // between the first read and lock acquisition.
        let message = self
            .with_retries("get_message", || self.messages.get_message(message_id))?
            .ok_or_else(|| TopicError::MessageNotFound(message_id.to_string()))?;
        if let Some(topic_id) = &message.topic_id {
            tracing::debug!(message = %message.id, topic = %topic_id, "Already assigned, no-op");
            return Ok(AssignmentOutcome::AlreadyAssigned {
                topic_id: topic_id.clone(),
            });
        }

        let outcome = self.assign_locked(&message)?;

        // Synchronous invalidation: stale topic lists must never outlive
        // the pass that made them stale.
        self.cache.invalidate_user(&message.user_id);
        drop(guard);

        tracing::info!(
            user = %message.user_id,
            message = %message.id,
            outcome = ?outcome,
            duration_ms = start.elapsed().as_millis() as u64,
            "Assignment pass complete"
        );
        Ok(outcome)
    }

    fn assign_locked(&self, message: &Message) -> TopicResult<AssignmentOutcome> {
        let mut topics = self.list_topics(&message.user_id)?;
        // Scan in creation order so a strictly-greater comparison keeps the
        // earliest-created topic on similarity ties.
        topics.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        // Idempotence against a partial earlier pass: membership persisted
        // but the message pointer write lost.
        if let Some(topic) = topics.iter().find(|t| t.contains_member(&message.id)) {
            self.with_retries("set_message_topic", || {
                self.messages.set_message_topic(&message.id, &topic.id)
            })?;
            tracing::debug!(message = %message.id, topic = %topic.id, "Membership already persisted, repaired pointer");
            return Ok(AssignmentOutcome::AlreadyAssigned {
                topic_id: topic.id.clone(),
            });
        }

        let mut documents = Vec::with_capacity(topics.len() + 1);
        documents.push(message.text.clone());
        documents.extend(topics.iter().map(|t| t.representative_text()));
        let corpus = Corpus::fit(&documents);
        let query = &corpus.vectors()[0];

        let mut best: Option<(usize, f64)> = None;
        for (i, vector) in corpus.vectors()[1..].iter().enumerate() {
            let score = cosine_similarity(query, vector);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((i, score));
            }
        }

        match best {
            Some((i, score)) if score >= self.config.similarity_threshold => {
                self.join_topic(message, &topics[i], score)
            }
            _ => self.create_topic_for(message),
        }
    }

    fn join_topic(
        &self,
        message: &Message,
        topic: &Topic,
        score: f64,
    ) -> TopicResult<AssignmentOutcome> {
        if let Err(e) = self.persist_join(message, topic.clone()) {
            match e {
                TopicError::Conflict(reason) => {
                    // One retry with fresh state; a second conflict is
                    // treated as transient and left for the retry sweep.
                    tracing::warn!(topic = %topic.id, reason = %reason, "Topic version conflict, retrying with fresh read");
                    let fresh = self
                        .with_retries("get_topic", || self.topics.get_topic(&topic.id))?
                        .ok_or_else(|| TopicError::TopicNotFound(topic.id.clone()))?;
                    self.persist_join(message, fresh).map_err(|e| match e {
                        TopicError::Conflict(reason) => TopicError::TransientStore(reason),
                        other => other,
                    })?;
                }
                other => return Err(other),
            }
        }

        self.with_retries("set_message_topic", || {
            self.messages.set_message_topic(&message.id, &topic.id)
        })?;

        tracing::info!(
            user = %message.user_id,
            topic = %topic.id,
            score = score,
            "Message joined existing topic"
        );
        Ok(AssignmentOutcome::Joined {
            topic_id: topic.id.clone(),
            score,
        })
    }

    /// Append the member, recompute keywords over all member texts, bump
    /// the version, and CAS-persist.
    fn persist_join(&self, message: &Message, mut topic: Topic) -> TopicResult<()> {
        if topic.contains_member(&message.id) {
            return Ok(());
        }
        let expected_version = topic.version;
        topic.add_member(&message.id);

        let mut texts: Vec<String> = self
            .with_retries("get_messages_for_topic", || {
                self.messages.get_messages_for_topic(&topic.id)
            })?
            .into_iter()
            .map(|m| m.text)
            .collect();
        texts.push(message.text.clone());
        topic.keywords = vectorize::top_keywords(&texts, self.config.max_topic_keywords);

        topic.touch();
        topic.version = expected_version + 1;
        self.with_retries("update_topic", || {
            self.topics.update_topic(&topic, expected_version)
        })
    }

    fn create_topic_for(&self, message: &Message) -> TopicResult<AssignmentOutcome> {
        let keywords = vectorize::top_keywords(
            std::slice::from_ref(&message.text),
            self.config.max_topic_keywords,
        );
        let topic = Topic::new(&message.user_id, &message.id, keywords);
        self.with_retries("create_topic", || self.topics.create_topic(&topic))?;
        self.with_retries("set_message_topic", || {
            self.messages.set_message_topic(&message.id, &topic.id)
        })?;

        tracing::info!(
            user = %message.user_id,
            topic = %topic.id,
            keywords = ?topic.keywords,
            "Created new topic"
        );
        Ok(AssignmentOutcome::Created { topic_id: topic.id })
    }

    // ── Query surface ──

    /// A user's topics, most recently updated first. Read-through cache.
    pub fn list_topics(&self, user_id: &str) -> TopicResult<Vec<Topic>> {
        let key = cache::topics_key(user_id);
        if let Some(topics) = self.cache.get_json::<Vec<Topic>>(&key) {
            return Ok(topics);
        }
        let topics =
            self.with_retries("get_topics_for_user", || self.topics.get_topics_for_user(user_id))?;
        self.cache.set_json(&key, &topics);
        Ok(topics)
    }

    /// Members of a topic, created_at ascending. Read-through cache.
    pub fn list_messages(&self, topic_id: &str) -> TopicResult<Vec<Message>> {
        let topic = self
            .with_retries("get_topic", || self.topics.get_topic(topic_id))?
            .ok_or_else(|| TopicError::TopicNotFound(topic_id.to_string()))?;

        let key = cache::topic_messages_key(&topic.user_id, topic_id);
        if let Some(messages) = self.cache.get_json::<Vec<Message>>(&key) {
            return Ok(messages);
        }
        let messages = self.with_retries("get_messages_for_topic", || {
            self.messages.get_messages_for_topic(topic_id)
        })?;
        self.cache.set_json(&key, &messages);
        Ok(messages)
    }

    /// A user's most recent messages, newest first. Read-through cache.
    pub fn list_recent_messages(&self, user_id: &str, limit: usize) -> TopicResult<Vec<Message>> {
        let key = cache::recent_messages_key(user_id, limit);
        if let Some(messages) = self.cache.get_json::<Vec<Message>>(&key) {
            return Ok(messages);
        }
        let messages = self.with_retries("get_messages_for_user", || {
            self.messages.get_messages_for_user(user_id, limit)
        })?;
        self.cache.set_json(&key, &messages);
        Ok(messages)
    }

    /// Messages whose assignment pass failed or never ran (topic_id NULL),
    /// oldest first. The retry sweep feeds these back into the queue.
    pub fn unassigned_messages(&self, user_id: &str) -> TopicResult<Vec<Message>> {
        self.with_retries("get_unassigned_for_user", || {
            self.messages.get_unassigned_for_user(user_id)
        })
    }

    // ── Internals ──

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .user_locks
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Retry transient store failures up to `max_store_retries` attempts
    /// with linear backoff. Other errors propagate immediately.
    fn with_retries<T>(
        &self,
        op: &str,
        mut call: impl FnMut() -> TopicResult<T>,
    ) -> TopicResult<T> {
        let max_attempts = self.config.max_store_retries.max(1);
        let mut attempt = 1;
        loop {
            match call() {
                Err(TopicError::TransientStore(reason)) if attempt < max_attempts => {
                    tracing::warn!(op, attempt, error = %reason, "Transient store error, retrying");
                    std::thread::sleep(Duration::from_millis(
                        RETRY_BACKOFF_BASE_MS * attempt as u64,
                    ));
                    attempt += 1;
                }
                Err(TopicError::TransientStore(reason)) => {
                    tracing::error!(op, attempts = attempt, error = %reason, "Store retries exhausted");
                    return Err(TopicError::TransientStore(reason));
                }
                other => return other,
            }
        }
    }
}
