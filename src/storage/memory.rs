//! In-memory store — the test fake and the default for embedded use.
//! Implements the same CAS and ordering contracts as the real adapters.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{MessageStore, TopicStore};
use crate::message::Message;
use crate::topic::Topic;
use crate::{TopicError, TopicResult};

#[derive(Default)]
pub struct MemoryStore {
    topics: Mutex<HashMap<String, Topic>>,
    messages: Mutex<HashMap<String, Message>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_topics(&self) -> TopicResult<std::sync::MutexGuard<'_, HashMap<String, Topic>>> {
        self.topics
            .lock()
            .map_err(|_| TopicError::TransientStore("topic map mutex poisoned".into()))
    }

    fn lock_messages(&self) -> TopicResult<std::sync::MutexGuard<'_, HashMap<String, Message>>> {
        self.messages
            .lock()
            .map_err(|_| TopicError::TransientStore("message map mutex poisoned".into()))
    }
}

impl TopicStore for MemoryStore {
    fn create_topic(&self, topic: &Topic) -> TopicResult<()> {
        let mut topics = self.lock_topics()?;
        if topics.contains_key(&topic.id) {
            return Err(TopicError::Conflict(format!(
                "topic {} already exists",
                topic.id
            )));
        }
        topics.insert(topic.id.clone(), topic.clone());
        Ok(())
    }

    fn update_topic(&self, topic: &Topic, expected_version: u64) -> TopicResult<()> {
        let mut topics = self.lock_topics()?;
        let current = topics
            .get(&topic.id)
            .ok_or_else(|| TopicError::TopicNotFound(topic.id.clone()))?;
        if current.version != expected_version {
            return Err(TopicError::Conflict(format!(
                "topic {} version {} != expected {}",
                topic.id, current.version, expected_version
            )));
        }
        topics.insert(topic.id.clone(), topic.clone());
        Ok(())
    }

    fn get_topic(&self, topic_id: &str) -> TopicResult<Option<Topic>> {
        Ok(self.lock_topics()?.get(topic_id).cloned())
    }

    fn get_topics_for_user(&self, user_id: &str) -> TopicResult<Vec<Topic>> {
        let topics = self.lock_topics()?;
        let mut out: Vec<Topic> = topics
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(out)
    }
}

impl MessageStore for MemoryStore {
    fn insert_message(&self, message: &Message) -> TopicResult<()> {
        let mut messages = self.lock_messages()?;
        if messages.contains_key(&message.id) {
            return Err(TopicError::Conflict(format!(
                "message {} already exists",
                message.id
            )));
        }
        messages.insert(message.id.clone(), message.clone());
        Ok(())
    }

    fn get_message(&self, message_id: &str) -> TopicResult<Option<Message>> {
        Ok(self.lock_messages()?.get(message_id).cloned())
    }

    fn set_message_topic(&self, message_id: &str, topic_id: &str) -> TopicResult<()> {
        let mut messages = self.lock_messages()?;
        let message = messages
            .get_mut(message_id)
            .ok_or_else(|| TopicError::MessageNotFound(message_id.to_string()))?;
        match &message.topic_id {
            Some(existing) if existing == topic_id => Ok(()),
            Some(existing) => Err(TopicError::Conflict(format!(
                "message {} already assigned to {}",
                message_id, existing
            ))),
            None => {
                message.topic_id = Some(topic_id.to_string());
                Ok(())
            }
        }
    }

    fn get_messages_for_topic(&self, topic_id: &str) -> TopicResult<Vec<Message>> {
        let messages = self.lock_messages()?;
        let mut out: Vec<Message> = messages
            .values()
            .filter(|m| m.topic_id.as_deref() == Some(topic_id))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    fn get_messages_for_user(&self, user_id: &str, limit: usize) -> TopicResult<Vec<Message>> {
        let messages = self.lock_messages()?;
        let mut out: Vec<Message> = messages
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        out.truncate(limit);
        Ok(out)
    }

    fn get_unassigned_for_user(&self, user_id: &str) -> TopicResult<Vec<Message>> {
        let messages = self.lock_messages()?;
        let mut out: Vec<Message> = messages
            .values()
            .filter(|m| m.user_id == user_id && m.topic_id.is_none())
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageRole;
    use crate::test_helpers::{MessageBuilder, TopicBuilder};

    #[test]
    fn test_topic_crud_and_ordering() {
        let store = MemoryStore::new();
        let older = TopicBuilder::new("u1").id("t-old").build();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let newer = TopicBuilder::new("u1").id("t-new").build();
        store.create_topic(&older).unwrap();
        store.create_topic(&newer).unwrap();
        store.create_topic(&TopicBuilder::new("u2").build()).unwrap();

        let topics = store.get_topics_for_user("u1").unwrap();
        assert_eq!(topics.len(), 2);
        // Most recently updated first.
        assert_eq!(topics[0].id, "t-new");
        assert_eq!(topics[1].id, "t-old");
    }

    #[test]
    fn test_update_topic_cas() {
        let store = MemoryStore::new();
        let mut topic = TopicBuilder::new("u1").build();
        store.create_topic(&topic).unwrap();

        topic.add_member("m2");
        topic.version = 1;
        store.update_topic(&topic, 0).unwrap();

        // Stale writer: expected version is no longer current.
        let mut stale = topic.clone();
        stale.version = 1;
        let err = store.update_topic(&stale, 0).unwrap_err();
        assert!(matches!(err, TopicError::Conflict(_)));
    }

    #[test]
    fn test_update_missing_topic_is_not_found() {
        let store = MemoryStore::new();
        let topic = TopicBuilder::new("u1").build();
        let err = store.update_topic(&topic, 0).unwrap_err();
        assert!(matches!(err, TopicError::TopicNotFound(_)));
    }

    #[test]
    fn test_set_message_topic_is_set_once() {
        let store = MemoryStore::new();
        let msg = MessageBuilder::new("u1", "hello world message").build();
        store.insert_message(&msg).unwrap();

        store.set_message_topic(&msg.id, "t1").unwrap();
        // Same topic: idempotent.
        store.set_message_topic(&msg.id, "t1").unwrap();
        // Different topic: conflict.
        let err = store.set_message_topic(&msg.id, "t2").unwrap_err();
        assert!(matches!(err, TopicError::Conflict(_)));
    }

    #[test]
    fn test_message_orderings() {
        let store = MemoryStore::new();
        for (i, text) in ["first message", "second message", "third message"]
            .iter()
            .enumerate()
        {
            let msg = MessageBuilder::new("u1", text)
                .id(&format!("m{}", i))
                .role(MessageRole::User)
                .build();
            store.insert_message(&msg).unwrap();
            store.set_message_topic(&format!("m{}", i), "t1").unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let by_topic = store.get_messages_for_topic("t1").unwrap();
        assert_eq!(
            by_topic.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
            vec!["m0", "m1", "m2"]
        );

        let recent = store.get_messages_for_user("u1", 2).unwrap();
        assert_eq!(
            recent.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
            vec!["m2", "m1"]
        );
    }

    #[test]
    fn test_unassigned_listing() {
        let store = MemoryStore::new();
        let assigned = MessageBuilder::new("u1", "assigned message").build();
        let pending = MessageBuilder::new("u1", "pending message").build();
        store.insert_message(&assigned).unwrap();
        store.insert_message(&pending).unwrap();
        store.set_message_topic(&assigned.id, "t1").unwrap();

        let unassigned = store.get_unassigned_for_user("u1").unwrap();
        assert_eq!(unassigned.len(), 1);
        assert_eq!(unassigned[0].id, pending.id);
    }
}
