//! Chat widget state: the displayed transcript, a loading flag and the
//! session id.
//!
//! Sending is not optimistic. The user's message and the reply are appended
//! together once the server answers; a failed request appends only a local
//! error message, so the list never shows half an exchange.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{ChatApi, HistoryMessage, SendMessageRequest};
use crate::storage::SessionStorage;

pub const SEND_ERROR_TEXT: &str = "Sorry, I encountered an error. Please try again.";

/// Who authored a displayed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

/// A message as shown in the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayMessage {
    pub id: String,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl DisplayMessage {
    fn local(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

impl From<HistoryMessage> for DisplayMessage {
    fn from(msg: HistoryMessage) -> Self {
        Self {
            id: msg.id,
            sender: msg.sender,
            text: msg.text,
            timestamp: msg.timestamp,
        }
    }
}

/// Widget state machine over an API and a session store.
pub struct ChatWidget<A: ChatApi, S: SessionStorage> {
    api: A,
    storage: S,
    messages: Vec<DisplayMessage>,
    session_id: Option<String>,
    is_loading: bool,
}

impl<A: ChatApi, S: SessionStorage> ChatWidget<A, S> {
    pub fn new(api: A, storage: S) -> Self {
        Self {
            api,
            storage,
            messages: Vec::new(),
            session_id: None,
            is_loading: false,
        }
    }

    pub fn messages(&self) -> &[DisplayMessage] {
        &self.messages
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Display state for hosts that render the widget. `send` takes
    /// `&mut self`, so overlapping sends are already ruled out by the borrow
    /// and this flag is never consulted as a guard.
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Pick up a stored session and load its transcript.
    ///
    /// If the transcript cannot be loaded the stored id is dropped and the
    /// widget starts fresh.
    pub async fn restore(&mut self) {
        let Some(saved) = self.storage.load() else {
            return;
        };
        self.session_id = Some(saved.clone());

        match self.api.history(&saved).await {
            Ok(history) => {
                self.messages = history.into_iter().map(DisplayMessage::from).collect();
            }
            Err(e) => {
                log::warn!("Failed to load conversation history: {e}");
                if let Err(e) = self.storage.clear() {
                    log::warn!("Failed to clear stored session: {e}");
                }
                self.session_id = None;
                self.messages.clear();
            }
        }
    }

    /// Send a message and wait for the reply.
    ///
    /// Ignored when `text` is blank. Returns the messages appended by this call.
    pub async fn send(&mut self, text: &str) -> &[DisplayMessage] {
        let text = text.trim();
        if text.is_empty() {
            return &[];
        }

        self.is_loading = true;
        let before = self.messages.len();

        let request = SendMessageRequest {
            message: text.to_string(),
            session_id: self.session_id.clone(),
        };
        match self.api.send_message(&request).await {
            Ok(resp) => {
                if self.session_id.is_none() {
                    if let Err(e) = self.storage.save(&resp.session_id) {
                        log::warn!("Failed to persist session id: {e}");
                    }
                    self.session_id = Some(resp.session_id);
                }
                self.messages.push(DisplayMessage::local(Sender::User, text));
                self.messages.push(DisplayMessage::local(Sender::Ai, resp.reply));
            }
            Err(e) => {
                log::error!("Failed to send message: {e}");
                self.messages
                    .push(DisplayMessage::local(Sender::Ai, SEND_ERROR_TEXT));
            }
        }

        self.is_loading = false;
        &self.messages[before..]
    }

    /// Forget the local session and transcript. Nothing is deleted server-side.
    pub fn clear(&mut self) {
        if let Err(e) = self.storage.clear() {
            log::warn!("Failed to clear stored session: {e}");
        }
        self.session_id = None;
        self.messages.clear();
    }
}
