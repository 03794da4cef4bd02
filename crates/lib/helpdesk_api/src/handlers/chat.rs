//! Chat request handlers.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use helpdesk_core::validation::ValidationError;
use tracing::debug;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{ChatMessageResponse, HistoryResponse, MessageView};

/// `POST /chat/message`: record a user turn and answer it.
///
/// The body is taken as untyped JSON so shape errors come back as field
/// violations rather than axum's plain-text rejection.
pub async fn send_message_handler(
    State(state): State<AppState>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> AppResult<Json<ChatMessageResponse>> {
    let Json(payload) = body?;
    let out = state.chat.handle_message(&payload).await?;
    debug!(session_id = %out.session_id, "chat reply sent");
    Ok(Json(ChatMessageResponse {
        reply: out.reply,
        session_id: out.session_id,
    }))
}

/// `GET /chat/history/{sessionId}`: full transcript, oldest first.
pub async fn history_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<HistoryResponse>> {
    let messages = state.chat.history(&session_id).await?;
    Ok(Json(HistoryResponse {
        messages: messages.into_iter().map(MessageView::from).collect(),
    }))
}

/// `GET /chat/history` without an id.
pub async fn missing_session_handler() -> AppError {
    ValidationError::single("sessionId", "Session ID is required").into()
}
