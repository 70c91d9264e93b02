use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_MESSAGE_CHARS;
use crate::{id_gen, time_utils, TopicError, TopicResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl std::str::FromStr for MessageRole {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "system" => Ok(Self::System),
            _ => Err(format!("Unknown message role: {}", s)),
        }
    }
}

impl Default for MessageRole {
    fn default() -> Self {
        Self::User
    }
}

/// One chat message. Immutable after creation except for `topic_id`,
/// which the assignment engine sets exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub user_id: String,
    pub topic_id: Option<String>,
    pub role: MessageRole,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Validate and build a new unassigned message.
    pub fn new(user_id: &str, role: MessageRole, text: &str) -> TopicResult<Self> {
        if user_id.trim().is_empty() {
            return Err(TopicError::InvalidInput("user_id must not be empty".into()));
        }
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(TopicError::InvalidInput("message text must not be empty".into()));
        }
        if trimmed.len() > MAX_MESSAGE_CHARS {
            return Err(TopicError::InvalidInput(format!(
                "message text exceeds {} chars",
                MAX_MESSAGE_CHARS
            )));
        }
        Ok(Self {
            id: id_gen::message_id(),
            user_id: user_id.to_string(),
            topic_id: None,
            role,
            text: trimmed.to_string(),
            created_at: time_utils::now(),
        })
    }

    pub fn is_assigned(&self) -> bool {
        self.topic_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty_text() {
        assert!(Message::new("u1", MessageRole::User, "   ").is_err());
        assert!(Message::new("", MessageRole::User, "hello there").is_err());
    }

    #[test]
    fn test_new_rejects_oversized_text() {
        let long = "x".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(Message::new("u1", MessageRole::User, &long).is_err());
    }

    #[test]
    fn test_new_starts_unassigned() {
        let msg = Message::new("u1", MessageRole::User, "my invoice is wrong").unwrap();
        assert!(!msg.is_assigned());
        assert_eq!(msg.role.as_str(), "user");
    }

    #[test]
    fn test_role_roundtrip() {
        for role in [MessageRole::User, MessageRole::Assistant, MessageRole::System] {
            let parsed: MessageRole = role.as_str().parse().unwrap();
            assert_eq!(parsed, role);
        }
        assert!("bot".parse::<MessageRole>().is_err());
    }
}
