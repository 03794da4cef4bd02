//! Wire types for the HTTP surface. Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use helpdesk_core::models::{Message, Sender};
use helpdesk_core::validation::FieldViolation;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `POST /chat/message` success body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageResponse {
    pub reply: String,
    pub session_id: Uuid,
}

/// One entry of `GET /chat/history/{sessionId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageView {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl From<Message> for MessageView {
    fn from(msg: Message) -> Self {
        Self {
            id: msg.id,
            sender: msg.sender,
            text: msg.text,
            timestamp: msg.timestamp,
        }
    }
}

/// `GET /chat/history/{sessionId}` success body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub messages: Vec<MessageView>,
}

/// `GET /health` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Error body shared by every failing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldViolation>>,
}
