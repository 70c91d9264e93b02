use uuid::Uuid;

/// Generate a unique topic id (UUID v4 hex, 32 chars).
pub fn topic_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Generate a unique message id (UUID v4 hex, 32 chars).
pub fn message_id() -> String {
    Uuid::new_v4().simple().to_string()
}
