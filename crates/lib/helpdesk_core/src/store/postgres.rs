//! PostgreSQL-backed conversation store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{ConversationStore, StoreError};
use crate::models::{Conversation, Message, NewMessage, Sender};
use crate::uuid::uuidv7;

/// SQLSTATE for `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Row returned by conversation queries.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ConversationRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ConversationRow> for Conversation {
    fn from(row: ConversationRow) -> Self {
        Conversation {
            id: row.id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Row returned by message queries.
#[derive(Debug, Clone, sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    conversation_id: Uuid,
    sender: String,
    text: String,
    timestamp: DateTime<Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = StoreError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let sender = row
            .sender
            .parse::<Sender>()
            .map_err(|e| StoreError::CorruptRow(format!("message {}: {e}", row.id)))?;
        Ok(Message {
            id: row.id,
            conversation_id: row.conversation_id,
            sender,
            text: row.text,
            timestamp: row.timestamp,
        })
    }
}

/// Durable store over a `sqlx` connection pool.
///
/// Schema is owned by the embedded migrations (see [`crate::migrate`]).
#[derive(Debug, Clone)]
pub struct PgConversationStore {
    pool: PgPool,
}

impl PgConversationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == FOREIGN_KEY_VIOLATION)
}

#[async_trait]
impl ConversationStore for PgConversationStore {
    async fn create_conversation(&self) -> Result<Conversation, StoreError> {
        // Timestamps come from the app clock, same as messages.
        let row = sqlx::query_as::<_, ConversationRow>(
            r#"
            INSERT INTO conversations (id, created_at, updated_at)
            VALUES ($1, $2, $2)
            RETURNING id, created_at, updated_at
            "#,
        )
        .bind(uuidv7())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_conversation(&self, id: &Uuid) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query_as::<_, ConversationRow>(
            "SELECT id, created_at, updated_at FROM conversations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn save_message(&self, message: NewMessage) -> Result<Message, StoreError> {
        let conversation_id = message.conversation_id;
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (id, conversation_id, sender, text, timestamp)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, conversation_id, sender, text, timestamp
            "#,
        )
        .bind(uuidv7())
        .bind(conversation_id)
        .bind(message.sender.as_str())
        .bind(&message.text)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::ConversationNotFound(conversation_id)
            } else {
                StoreError::Db(e)
            }
        })?;

        // Touch conversation updated_at
        sqlx::query("UPDATE conversations SET updated_at = $1 WHERE id = $2")
            .bind(row.timestamp)
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Message::try_from(row)
    }

    async fn get_conversation_history(&self, id: &Uuid) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, conversation_id, sender, text, timestamp
            FROM messages
            WHERE conversation_id = $1
            ORDER BY timestamp ASC, id ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Message::try_from).collect()
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_row_with_unknown_sender_is_corrupt() {
        let row = MessageRow {
            id: Uuid::nil(),
            conversation_id: Uuid::nil(),
            sender: "bot".into(),
            text: "x".into(),
            timestamp: Utc::now(),
        };
        assert!(matches!(
            Message::try_from(row),
            Err(StoreError::CorruptRow(_))
        ));
    }

    #[test]
    fn message_row_converts() {
        let row = MessageRow {
            id: Uuid::nil(),
            conversation_id: Uuid::nil(),
            sender: "ai".into(),
            text: "hello".into(),
            timestamp: Utc::now(),
        };
        let msg = Message::try_from(row).unwrap();
        assert_eq!(msg.sender, Sender::Ai);
        assert_eq!(msg.text, "hello");
    }
}
