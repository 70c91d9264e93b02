//! Nova Topics — topic clustering and caching core for a conversational
//! assistant backend.
//!
//! Pipeline: a message is ingested and durably stored by the API layer,
//! which then hands it to [`AssignmentQueue::on_message_created`]. A worker
//! runs the assignment pass: the message is vectorized (TF-IDF), compared
//! against the user's existing topics (cosine similarity), and either joins
//! the best match or starts a new topic. Affected cache entries are
//! invalidated before the pass reports completion.
//!
//! The external document store and key-value cache are seams: narrow traits
//! with an embedded SQLite adapter and in-memory implementations.

// Foundation
pub mod id_gen;
pub mod time_utils;

// Core types
pub mod config;
pub mod constants;
pub mod error;
pub mod message;
pub mod topic;

// Sub-systems
pub mod cache;
pub mod engine;
pub mod storage;
pub mod tracing_init;
pub mod vectorize;

#[cfg(test)]
pub mod test_helpers;

// Re-exports for convenience
pub use config::EngineConfig;
pub use engine::assignment::{AssignmentEngine, AssignmentOutcome};
pub use engine::queue::AssignmentQueue;
pub use error::{TopicError, TopicResult};
pub use message::{Message, MessageRole};
pub use topic::Topic;
