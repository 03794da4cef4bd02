//! In-process conversation store used when no database is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ConversationStore, StoreError};
use crate::models::{Conversation, Message, NewMessage};
use crate::uuid::uuidv7;

#[derive(Debug, Default)]
struct MemoryState {
    conversations: HashMap<Uuid, Conversation>,
    messages: HashMap<Uuid, Vec<Message>>,
}

/// Degraded-but-functional store: nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryConversationStore {
    state: RwLock<MemoryState>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn create_conversation(&self) -> Result<Conversation, StoreError> {
        let now = Utc::now();
        let conversation = Conversation {
            id: uuidv7(),
            created_at: now,
            updated_at: now,
        };

        let mut state = self.state.write().await;
        state
            .conversations
            .insert(conversation.id, conversation.clone());
        state.messages.insert(conversation.id, Vec::new());
        Ok(conversation)
    }

    async fn get_conversation(&self, id: &Uuid) -> Result<Option<Conversation>, StoreError> {
        Ok(self.state.read().await.conversations.get(id).cloned())
    }

    async fn save_message(&self, message: NewMessage) -> Result<Message, StoreError> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        let conversation = state
            .conversations
            .get_mut(&message.conversation_id)
            .ok_or(StoreError::ConversationNotFound(message.conversation_id))?;
        conversation.updated_at = now;

        let saved = Message {
            id: uuidv7(),
            conversation_id: message.conversation_id,
            sender: message.sender,
            text: message.text,
            timestamp: now,
        };
        state
            .messages
            .entry(saved.conversation_id)
            .or_default()
            .push(saved.clone());
        Ok(saved)
    }

    async fn get_conversation_history(&self, id: &Uuid) -> Result<Vec<Message>, StoreError> {
        // Appends happen under the write lock, so insertion order is timestamp order.
        Ok(self
            .state
            .read()
            .await
            .messages
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
