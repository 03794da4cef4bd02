//! Integration tests: build the router over the in-memory store and drive it
//! with `oneshot` requests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use helpdesk_api::{AppState, router};
use helpdesk_core::cache::CacheGateway;
use helpdesk_core::reply::{
    Completion, CompletionError, CompletionRequest, CompletionService, ReplyGenerator, Throttle,
};
use helpdesk_core::store::MemoryConversationStore;
use serde_json::{Value, json};
use tower::ServiceExt;

const RETURN_POLICY: &str = "We offer a 30-day return policy. Items must be unused and in original packaging. Return shipping is free for defective items.";

fn fallback_app() -> Router {
    router(AppState::new(
        Arc::new(MemoryConversationStore::new()),
        ReplyGenerator::fallback_only(),
        CacheGateway::disabled(),
    ))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("parse JSON")
    };
    (status, json)
}

fn post_message(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat/message")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn return_policy_question_gets_fallback_reply_and_session() {
    let app = fallback_app();

    let (status, json) = send(&app, post_message(json!({"message": "What's your return policy?"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["reply"], RETURN_POLICY);
    let session_id = json["sessionId"].as_str().expect("sessionId is string");
    assert!(!session_id.is_empty());
}

#[tokio::test]
async fn new_session_history_has_user_then_ai() {
    let app = fallback_app();

    let (_, json) = send(&app, post_message(json!({"message": "  <b>Do you ship to USA?</b> "}))).await;
    let session_id = json["sessionId"].as_str().unwrap().to_string();

    let (status, history) = send(&app, get(&format!("/chat/history/{session_id}"))).await;
    assert_eq!(status, StatusCode::OK);

    let messages = history["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["sender"], "user");
    assert_eq!(messages[0]["text"], "bDo you ship to USA?/b");
    assert_eq!(messages[1]["sender"], "ai");
    assert_eq!(messages[1]["text"], json["reply"]);
    for msg in messages {
        assert!(msg["id"].is_string());
        assert!(msg["timestamp"].is_string());
    }
}

#[tokio::test]
async fn unknown_session_behaves_like_new_session() {
    let app = fallback_app();
    let stale = uuid::Uuid::now_v7().to_string();

    let (status, json) = send(
        &app,
        post_message(json!({"message": "What are your support hours?", "sessionId": stale})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let issued = json["sessionId"].as_str().unwrap();
    assert_ne!(issued, stale);

    let (_, history) = send(&app, get(&format!("/chat/history/{issued}"))).await;
    assert_eq!(history["messages"].as_array().unwrap().len(), 2);

    let (status, _) = send(&app, get(&format!("/chat/history/{stale}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_messages_are_rejected_without_persisting() {
    let app = fallback_app();

    let (_, json) = send(&app, post_message(json!({"message": "hello"}))).await;
    let session_id = json["sessionId"].as_str().unwrap().to_string();

    for bad in [
        json!({"message": "", "sessionId": session_id}),
        json!({"message": "    ", "sessionId": session_id}),
        json!({"message": "x".repeat(1001), "sessionId": session_id}),
        json!({"sessionId": session_id}),
    ] {
        let (status, body) = send(&app, post_message(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Validation error");
        assert!(body["details"].is_array());
    }

    let (_, history) = send(&app, get(&format!("/chat/history/{session_id}"))).await;
    assert_eq!(history["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn malformed_session_id_is_rejected() {
    let app = fallback_app();
    let (status, body) = send(&app, post_message(json!({"message": "hi", "sessionId": "abc"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "sessionId");
}

#[tokio::test]
async fn only_hyphenated_session_ids_are_accepted() {
    let app = fallback_app();
    let (_, json) = send(&app, post_message(json!({"message": "hello"}))).await;
    let id: uuid::Uuid = json["sessionId"].as_str().unwrap().parse().unwrap();

    for form in [
        id.simple().to_string(),
        id.braced().to_string(),
        id.urn().to_string(),
    ] {
        let (status, body) =
            send(&app, post_message(json!({"message": "hours?", "sessionId": form}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{form}");
        assert_eq!(body["details"][0]["field"], "sessionId");
    }

    let (status, _) = send(&app, get(&format!("/chat/history/{}", id.simple()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, history) = send(&app, get(&format!("/chat/history/{id}"))).await;
    assert_eq!(history["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn non_json_body_is_a_validation_error() {
    let app = fallback_app();
    let req = Request::builder()
        .method("POST")
        .uri("/chat/message")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "body");
}

#[tokio::test]
async fn unknown_history_is_404() {
    let app = fallback_app();
    let (status, body) = send(&app, get("/chat/history/nonexistent-id")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Conversation not found"}));
}

#[tokio::test]
async fn missing_history_id_is_400() {
    let app = fallback_app();
    let (status, body) = send(&app, get("/chat/history/")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["message"], "Session ID is required");
}

#[tokio::test]
async fn history_is_idempotent() {
    let app = fallback_app();
    let (_, json) = send(&app, post_message(json!({"message": "warranty"}))).await;
    let uri = format!("/chat/history/{}", json["sessionId"].as_str().unwrap());

    let (_, first) = send(&app, get(&uri)).await;
    let (_, second) = send(&app, get(&uri)).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn tie_break_uses_table_order() {
    let app = fallback_app();
    let (_, json) = send(
        &app,
        post_message(json!({"message": "How much is shipping for a return?"})),
    )
    .await;
    assert_eq!(json["reply"], RETURN_POLICY);
}

#[tokio::test]
async fn health_reports_ok() {
    let app = fallback_app();
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

/// Completion stub that counts calls.
struct CountingCompletion {
    calls: AtomicU32,
}

#[async_trait]
impl CompletionService for CountingCompletion {
    async fn complete(&self, _request: &CompletionRequest) -> Result<Completion, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Completion {
            content: Some("Live answer from the model.".into()),
            usage: None,
        })
    }

    fn name(&self) -> &str {
        "counting"
    }
}

#[tokio::test]
async fn throttled_second_request_uses_fallback_table() {
    let completion = Arc::new(CountingCompletion {
        calls: AtomicU32::new(0),
    });
    let app = router(AppState::new(
        Arc::new(MemoryConversationStore::new()),
        ReplyGenerator::new(
            Some(completion.clone() as Arc<dyn CompletionService>),
            Throttle::new(Duration::from_secs(60)),
        ),
        CacheGateway::disabled(),
    ));

    let (_, first) = send(&app, post_message(json!({"message": "What's your return policy?"}))).await;
    let (_, second) = send(&app, post_message(json!({"message": "What's your return policy?"}))).await;

    assert_eq!(completion.calls.load(Ordering::SeqCst), 1);
    assert_eq!(first["reply"], "Live answer from the model.");
    assert_eq!(second["reply"], RETURN_POLICY);
}

/// Completion stub that always reports a rate limit.
struct RateLimitedCompletion;

#[async_trait]
impl CompletionService for RateLimitedCompletion {
    async fn complete(&self, _request: &CompletionRequest) -> Result<Completion, CompletionError> {
        Err(CompletionError::RateLimited)
    }

    fn name(&self) -> &str {
        "rate-limited"
    }
}

#[tokio::test]
async fn completion_failure_still_returns_200_and_persists_substitute() {
    let app = router(AppState::new(
        Arc::new(MemoryConversationStore::new()),
        ReplyGenerator::new(Some(Arc::new(RateLimitedCompletion)), Throttle::new(Duration::ZERO)),
        CacheGateway::disabled(),
    ));

    let (status, json) = send(&app, post_message(json!({"message": "price?"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["reply"],
        "I'm experiencing high traffic right now. Please try again in a moment."
    );

    let (_, history) = send(
        &app,
        get(&format!("/chat/history/{}", json["sessionId"].as_str().unwrap())),
    )
    .await;
    assert_eq!(history["messages"][1]["text"], json["reply"]);
}
