use thiserror::Error;

#[derive(Error, Debug)]
pub enum TopicError {
    /// Malformed input (empty text, oversized message, blank user id).
    /// Rejected synchronously before anything enters the pipeline.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Topic not found: {0}")]
    TopicNotFound(String),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    /// Timeout or connection failure against the topic/message store.
    /// Retried with backoff; after exhaustion the assignment pass fails
    /// retriably and the message keeps topic_id = NULL.
    #[error("Transient store error: {0}")]
    TransientStore(String),

    /// Concurrent-update detected during persistence (version mismatch).
    /// Retried once with a fresh read, then escalated to TransientStore.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Raw database errors from rusqlite
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type TopicResult<T> = Result<T, TopicError>;
