//! Request orchestrator for the chat flow.
//!
//! One call to [`ChatService::handle_message`] walks:
//!
//! validate → resolve conversation → persist user turn → build history →
//! generate reply → persist AI turn → respond
//!
//! The user turn is stored before a reply is generated and the AI turn is
//! stored before the response is returned, so a client retrying after a
//! dropped response sees a consistent transcript.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{HistoryTurn, Message, NewMessage, Sender};
use crate::reply::ReplyGenerator;
use crate::store::{ConversationStore, StoreError};
use crate::uuid::parse_id;
use crate::validation::{ValidationError, validate_chat_request};

/// Errors surfaced by the orchestrator.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Conversation not found")]
    ConversationNotFound,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Successful result of a chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub reply: String,
    pub session_id: Uuid,
}

/// Ties validation, storage and reply generation together.
#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn ConversationStore>,
    replies: Arc<ReplyGenerator>,
}

impl ChatService {
    pub fn new(store: Arc<dyn ConversationStore>, replies: Arc<ReplyGenerator>) -> Self {
        Self { store, replies }
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    /// Handle one inbound chat payload.
    pub async fn handle_message(&self, payload: &Value) -> Result<ChatReply, ChatError> {
        let request = validate_chat_request(payload)?;

        let conversation_id = self.resolve_conversation(request.session_id).await?;

        self.store
            .save_message(NewMessage::user(conversation_id, request.message.clone()))
            .await?;
        debug!(%conversation_id, "user turn persisted");

        let history = self.store.get_conversation_history(&conversation_id).await?;
        let turns = prior_turns(&history);
        debug!(%conversation_id, turns = turns.len(), "history built");

        let reply = self
            .replies
            .generate_reply(&turns, &request.message)
            .await;
        if let Some(reason) = reply.degraded_reason() {
            debug!(%conversation_id, ?reason, "reply degraded");
        }
        let text = reply.into_text();

        self.store
            .save_message(NewMessage::ai(conversation_id, text.clone()))
            .await?;
        debug!(%conversation_id, "ai turn persisted");

        Ok(ChatReply {
            reply: text,
            session_id: conversation_id,
        })
    }

    /// Messages of a conversation, oldest first.
    ///
    /// Ids that are not UUID-shaped cannot name a conversation and are
    /// reported as not found.
    pub async fn history(&self, session_id: &str) -> Result<Vec<Message>, ChatError> {
        if session_id.trim().is_empty() {
            return Err(ValidationError::single("sessionId", "Session ID is required").into());
        }
        let id = parse_id(session_id).ok_or(ChatError::ConversationNotFound)?;

        if self.store.get_conversation(&id).await?.is_none() {
            return Err(ChatError::ConversationNotFound);
        }
        Ok(self.store.get_conversation_history(&id).await?)
    }

    /// Adopt the supplied id if it names a conversation, otherwise start a new one.
    async fn resolve_conversation(&self, session_id: Option<Uuid>) -> Result<Uuid, ChatError> {
        if let Some(id) = session_id {
            if self.store.get_conversation(&id).await?.is_some() {
                return Ok(id);
            }
            debug!(session_id = %id, "unknown session, starting new conversation");
        }

        let conversation = self.store.create_conversation().await?;
        info!(
            conversation_id = %conversation.id,
            backend = self.store.backend(),
            "conversation created"
        );
        Ok(conversation.id)
    }
}

/// Stored history minus the just-persisted user turn, which the generator
/// receives separately as the new message.
fn prior_turns(history: &[Message]) -> Vec<HistoryTurn> {
    let prior = match history.last() {
        Some(last) if last.sender == Sender::User => &history[..history.len() - 1],
        _ => history,
    };
    prior.iter().map(HistoryTurn::from).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::models::Role;
    use crate::reply::{
        Completion, CompletionError, CompletionRequest, CompletionService, Throttle,
        fallback::FALLBACK_RESPONSES,
    };
    use crate::store::MemoryConversationStore;

    fn service() -> ChatService {
        ChatService::new(
            Arc::new(MemoryConversationStore::new()),
            Arc::new(ReplyGenerator::fallback_only()),
        )
    }

    /// Echoes the number of turns it received; remembers the last request.
    #[derive(Default)]
    struct RecordingCompletion {
        last: Mutex<Option<CompletionRequest>>,
    }

    #[async_trait]
    impl CompletionService for RecordingCompletion {
        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<Completion, CompletionError> {
            *self.last.lock().unwrap() = Some(request.clone());
            Ok(Completion {
                content: Some(format!("seen {} messages", request.messages.len())),
                usage: None,
            })
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    #[tokio::test]
    async fn new_session_records_user_then_ai() {
        let chat = service();
        let out = chat
            .handle_message(&json!({"message": "What's your return policy?"}))
            .await
            .unwrap();
        assert_eq!(out.reply, FALLBACK_RESPONSES[0].1);

        let history = chat.history(&out.session_id.to_string()).await.unwrap();
        let summary: Vec<_> = history.iter().map(|m| (m.sender, m.text.as_str())).collect();
        assert_eq!(
            summary,
            vec![
                (Sender::User, "What's your return policy?"),
                (Sender::Ai, FALLBACK_RESPONSES[0].1),
            ]
        );
    }

    #[tokio::test]
    async fn known_session_is_reused() {
        let chat = service();
        let first = chat.handle_message(&json!({"message": "hi"})).await.unwrap();
        let second = chat
            .handle_message(&json!({"message": "hours?", "sessionId": first.session_id.to_string()}))
            .await
            .unwrap();
        assert_eq!(first.session_id, second.session_id);
        assert_eq!(
            chat.history(&first.session_id.to_string())
                .await
                .unwrap()
                .len(),
            4
        );
    }

    #[tokio::test]
    async fn unknown_session_gets_fresh_conversation() {
        let chat = service();
        let stale = Uuid::now_v7();
        let out = chat
            .handle_message(&json!({"message": "help", "sessionId": stale.to_string()}))
            .await
            .unwrap();
        assert_ne!(out.session_id, stale);
        assert!(chat.store().get_conversation(&stale).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_payload_persists_nothing() {
        let store = Arc::new(MemoryConversationStore::new());
        let chat = ChatService::new(store.clone(), Arc::new(ReplyGenerator::fallback_only()));
        let conv = store.create_conversation().await.unwrap();

        let err = chat
            .handle_message(&json!({"message": "   ", "sessionId": conv.id.to_string()}))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
        assert!(store.get_conversation_history(&conv.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn generator_sees_prior_turns_and_new_message_once() {
        let completion = Arc::new(RecordingCompletion::default());
        let chat = ChatService::new(
            Arc::new(MemoryConversationStore::new()),
            Arc::new(ReplyGenerator::new(
                Some(completion.clone() as Arc<dyn CompletionService>),
                Throttle::new(Duration::ZERO),
            )),
        );

        let first = chat.handle_message(&json!({"message": "hello"})).await.unwrap();
        assert_eq!(first.reply, "seen 2 messages");

        chat.handle_message(&json!({"message": "shipping?", "sessionId": first.session_id.to_string()}))
            .await
            .unwrap();

        let req = completion.last.lock().unwrap().clone().unwrap();
        let turns: Vec<_> = req
            .messages
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .collect();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[1], (Role::User, "hello"));
        assert_eq!(turns[2], (Role::Assistant, "seen 2 messages"));
        assert_eq!(turns[3], (Role::User, "shipping?"));
    }

    #[tokio::test]
    async fn history_of_unknown_or_malformed_id_is_not_found() {
        let chat = service();
        assert!(matches!(
            chat.history("nonexistent-id").await,
            Err(ChatError::ConversationNotFound)
        ));
        assert!(matches!(
            chat.history(&Uuid::now_v7().to_string()).await,
            Err(ChatError::ConversationNotFound)
        ));
        assert!(matches!(
            chat.history("  ").await,
            Err(ChatError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn history_is_idempotent() {
        let chat = service();
        let out = chat.handle_message(&json!({"message": "price"})).await.unwrap();
        let id = out.session_id.to_string();
        assert_eq!(chat.history(&id).await.unwrap(), chat.history(&id).await.unwrap());
    }

    #[test]
    fn prior_turns_drops_trailing_user_turn_only() {
        let conv = Uuid::nil();
        let mk = |sender, text: &str| Message {
            id: Uuid::now_v7(),
            conversation_id: conv,
            sender,
            text: text.into(),
            timestamp: chrono::Utc::now(),
        };
        let history = vec![mk(Sender::User, "a"), mk(Sender::Ai, "b"), mk(Sender::User, "c")];
        let turns = prior_turns(&history);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].role, Role::Assistant);

        assert!(prior_turns(&[]).is_empty());
    }
}
