use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{id_gen, time_utils};

/// A cluster of semantically related messages belonging to one user.
///
/// `version` is the optimistic-concurrency token: incremented on every
/// persisted mutation and checked by `TopicStore::update_topic`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub user_id: String,
    /// Top terms by TF-IDF weight over member texts, capped at
    /// `max_topic_keywords`, ties broken lexically.
    pub keywords: Vec<String>,
    /// Member ids, insertion order. Set semantics: no duplicates.
    pub member_message_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
}

impl Topic {
    /// New topic with a single founding member.
    pub fn new(user_id: &str, first_message_id: &str, keywords: Vec<String>) -> Self {
        let now = time_utils::now();
        Self {
            id: id_gen::topic_id(),
            user_id: user_id.to_string(),
            keywords,
            member_message_ids: vec![first_message_id.to_string()],
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn contains_member(&self, message_id: &str) -> bool {
        self.member_message_ids.iter().any(|m| m == message_id)
    }

    /// Append a member id; no-op if already present.
    pub fn add_member(&mut self, message_id: &str) {
        if !self.contains_member(message_id) {
            self.member_message_ids.push(message_id.to_string());
        }
    }

    /// Document standing in for this topic during similarity scoring.
    pub fn representative_text(&self) -> String {
        self.keywords.join(" ")
    }

    pub fn touch(&mut self) {
        self.updated_at = time_utils::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_member_is_set_like() {
        let mut topic = Topic::new("u1", "m1", vec!["invoice".into()]);
        topic.add_member("m2");
        topic.add_member("m2");
        topic.add_member("m1");
        assert_eq!(topic.member_message_ids, vec!["m1", "m2"]);
    }

    #[test]
    fn test_representative_text_joins_keywords() {
        let topic = Topic::new("u1", "m1", vec!["invoice".into(), "billing".into()]);
        assert_eq!(topic.representative_text(), "invoice billing");
    }

    #[test]
    fn test_touch_advances_updated_at() {
        let mut topic = Topic::new("u1", "m1", vec![]);
        let before = topic.updated_at;
        std::thread::sleep(std::time::Duration::from_millis(2));
        topic.touch();
        assert!(topic.updated_at > before);
        assert_eq!(topic.created_at, before);
    }
}
