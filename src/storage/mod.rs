//! Topic Store — thin persistence contract over the external document
//! database. The engine only depends on these traits; production wires an
//! adapter for the real store, tests use [`MemoryStore`], and the embedded
//! [`SqliteStore`] serves single-process deployments.
//!
//! Consistency contract: strong within one store call; read-your-writes is
//! NOT guaranteed across the cache, which is why the engine invalidates
//! cache keys synchronously after every write.

pub mod memory;
pub mod sqlite;

use crate::message::Message;
use crate::topic::Topic;
use crate::TopicResult;

/// Topic persistence.
///
/// `update_topic` is a compare-and-swap: the caller passes the topic with
/// `version = expected_version + 1` already set, and the store persists it
/// only if the stored version still equals `expected_version`, failing
/// with `TopicError::Conflict` otherwise.
pub trait TopicStore: Send + Sync {
    fn create_topic(&self, topic: &Topic) -> TopicResult<()>;
    fn update_topic(&self, topic: &Topic, expected_version: u64) -> TopicResult<()>;
    fn get_topic(&self, topic_id: &str) -> TopicResult<Option<Topic>>;
    /// All of a user's topics, most recently updated first.
    fn get_topics_for_user(&self, user_id: &str) -> TopicResult<Vec<Topic>>;
}

/// Message persistence. Messages are immutable except for `topic_id`,
/// which `set_message_topic` sets exactly once.
pub trait MessageStore: Send + Sync {
    fn insert_message(&self, message: &Message) -> TopicResult<()>;
    fn get_message(&self, message_id: &str) -> TopicResult<Option<Message>>;
    /// Set-once: re-pointing to the same topic is a no-op, re-pointing to
    /// a different topic is a `Conflict`.
    fn set_message_topic(&self, message_id: &str, topic_id: &str) -> TopicResult<()>;
    /// Members of a topic, created_at ascending.
    fn get_messages_for_topic(&self, topic_id: &str) -> TopicResult<Vec<Message>>;
    /// A user's messages, most recent first, capped at `limit`.
    fn get_messages_for_user(&self, user_id: &str, limit: usize) -> TopicResult<Vec<Message>>;
    /// Messages still awaiting assignment (topic_id NULL), oldest first.
    fn get_unassigned_for_user(&self, user_id: &str) -> TopicResult<Vec<Message>>;
}

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
