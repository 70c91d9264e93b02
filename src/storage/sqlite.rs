//! SQLite adapter — embedded stand-in for the external document store.
//! List-valued fields (keywords, member ids) are JSON-encoded columns;
//! timestamps are ISO 8601 text, which sorts chronologically.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{MessageStore, TopicStore};
use crate::message::{Message, MessageRole};
use crate::time_utils;
use crate::topic::Topic;
use crate::{TopicError, TopicResult};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

// ── Row mapping ──

fn topic_from_row(row: &Row) -> rusqlite::Result<Topic> {
    let keywords_json: String = row.get("keywords")?;
    let members_json: String = row.get("member_message_ids")?;
    let created_str: String = row.get("created_at")?;
    let updated_str: String = row.get("updated_at")?;

    Ok(Topic {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        keywords: serde_json::from_str(&keywords_json).unwrap_or_default(),
        member_message_ids: serde_json::from_str(&members_json).unwrap_or_default(),
        created_at: time_utils::from_sqlite(&created_str).unwrap_or_else(|_| chrono::Utc::now()),
        updated_at: time_utils::from_sqlite(&updated_str).unwrap_or_else(|_| chrono::Utc::now()),
        version: row.get("version")?,
    })
}

fn message_from_row(row: &Row) -> rusqlite::Result<Message> {
    let role_str: String = row.get("role")?;
    let created_str: String = row.get("created_at")?;

    Ok(Message {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        topic_id: row.get("topic_id")?,
        role: role_str.parse().unwrap_or(MessageRole::User),
        text: row.get("content")?,
        created_at: time_utils::from_sqlite(&created_str).unwrap_or_else(|_| chrono::Utc::now()),
    })
}

// ── Schema ──

fn init_schema(conn: &Connection) -> TopicResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS topics (
            id                  TEXT PRIMARY KEY,
            user_id             TEXT NOT NULL,
            keywords            TEXT NOT NULL DEFAULT '[]',
            member_message_ids  TEXT NOT NULL DEFAULT '[]',
            created_at          TEXT NOT NULL,
            updated_at          TEXT NOT NULL,
            version             INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_topics_user ON topics(user_id, updated_at);

        CREATE TABLE IF NOT EXISTS messages (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL,
            topic_id    TEXT,
            role        TEXT NOT NULL DEFAULT 'user',
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_messages_user ON messages(user_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_messages_topic ON messages(topic_id, created_at);",
    )?;
    Ok(())
}

impl SqliteStore {
    pub fn open(path: &Path) -> TopicResult<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        init_schema(&conn)?;
        tracing::info!(path = %path.display(), "SQLite store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> TopicResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> TopicResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| TopicError::TransientStore("sqlite connection mutex poisoned".into()))
    }
}

impl TopicStore for SqliteStore {
    fn create_topic(&self, topic: &Topic) -> TopicResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO topics (id, user_id, keywords, member_message_ids,
                                 created_at, updated_at, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                topic.id,
                topic.user_id,
                serde_json::to_string(&topic.keywords).unwrap_or_else(|_| "[]".into()),
                serde_json::to_string(&topic.member_message_ids)
                    .unwrap_or_else(|_| "[]".into()),
                time_utils::to_sqlite(&topic.created_at),
                time_utils::to_sqlite(&topic.updated_at),
                topic.version,
            ],
        )?;
        Ok(())
    }

    fn update_topic(&self, topic: &Topic, expected_version: u64) -> TopicResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE topics
             SET keywords = ?1, member_message_ids = ?2, updated_at = ?3, version = ?4
             WHERE id = ?5 AND version = ?6",
            params![
                serde_json::to_string(&topic.keywords).unwrap_or_else(|_| "[]".into()),
                serde_json::to_string(&topic.member_message_ids)
                    .unwrap_or_else(|_| "[]".into()),
                time_utils::to_sqlite(&topic.updated_at),
                topic.version,
                topic.id,
                expected_version,
            ],
        )?;
        if changed == 0 {
            let exists = conn
                .query_row(
                    "SELECT 1 FROM topics WHERE id = ?1",
                    params![topic.id],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if exists {
                return Err(TopicError::Conflict(format!(
                    "topic {} version advanced past {}",
                    topic.id, expected_version
                )));
            }
            return Err(TopicError::TopicNotFound(topic.id.clone()));
        }
        Ok(())
    }

    fn get_topic(&self, topic_id: &str) -> TopicResult<Option<Topic>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT * FROM topics WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![topic_id], topic_from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    fn get_topics_for_user(&self, user_id: &str) -> TopicResult<Vec<Topic>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM topics WHERE user_id = ?1
             ORDER BY updated_at DESC, created_at DESC, id ASC",
        )?;
        let rows = stmt.query_map(params![user_id], topic_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

impl MessageStore for SqliteStore {
    fn insert_message(&self, message: &Message) -> TopicResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO messages (id, user_id, topic_id, role, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                message.id,
                message.user_id,
                message.topic_id,
                message.role.as_str(),
                message.text,
                time_utils::to_sqlite(&message.created_at),
            ],
        )?;
        Ok(())
    }

    fn get_message(&self, message_id: &str) -> TopicResult<Option<Message>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT * FROM messages WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![message_id], message_from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    fn set_message_topic(&self, message_id: &str, topic_id: &str) -> TopicResult<()> {
        let conn = self.lock()?;
        let current: Option<Option<String>> = conn
            .query_row(
                "SELECT topic_id FROM messages WHERE id = ?1",
                params![message_id],
                |row| row.get(0),
            )
            .optional()?;

        match current {
            None => Err(TopicError::MessageNotFound(message_id.to_string())),
            Some(Some(existing)) if existing == topic_id => Ok(()),
            Some(Some(existing)) => Err(TopicError::Conflict(format!(
                "message {} already assigned to {}",
                message_id, existing
            ))),
            Some(None) => {
                conn.execute(
                    "UPDATE messages SET topic_id = ?1 WHERE id = ?2 AND topic_id IS NULL",
                    params![topic_id, message_id],
                )?;
                Ok(())
            }
        }
    }

    fn get_messages_for_topic(&self, topic_id: &str) -> TopicResult<Vec<Message>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM messages WHERE topic_id = ?1
             ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![topic_id], message_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn get_messages_for_user(&self, user_id: &str, limit: usize) -> TopicResult<Vec<Message>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM messages WHERE user_id = ?1
             ORDER BY created_at DESC, id ASC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit as i64], message_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn get_unassigned_for_user(&self, user_id: &str) -> TopicResult<Vec<Message>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM messages WHERE user_id = ?1 AND topic_id IS NULL
             ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![user_id], message_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}
