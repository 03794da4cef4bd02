//! Domain types shared by the store, the reply generator and the API.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A conversation thread grouping an ordered set of messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

impl Sender {
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Ai => "ai",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored sender column holds an unknown value.
#[derive(Debug, thiserror::Error)]
#[error("unknown sender: {0}")]
pub struct UnknownSender(pub String);

impl FromStr for Sender {
    type Err = UnknownSender;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Sender::User),
            "ai" => Ok(Sender::Ai),
            other => Err(UnknownSender(other.to_string())),
        }
    }
}

/// A persisted conversation turn. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Input for [`crate::store::ConversationStore::save_message`].
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: Uuid,
    pub sender: Sender,
    pub text: String,
}

impl NewMessage {
    pub fn user(conversation_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            conversation_id,
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn ai(conversation_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            conversation_id,
            sender: Sender::Ai,
            text: text.into(),
        }
    }
}

/// Role of a prior turn as seen by the completion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One prior turn of conversation history handed to the reply generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for HistoryTurn {
    fn from(msg: &Message) -> Self {
        let role = match msg.sender {
            Sender::User => Role::User,
            Sender::Ai => Role::Assistant,
        };
        Self {
            role,
            content: msg.text.clone(),
        }
    }
}

/// Token accounting reported by the completion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}
