//! Typed HTTP client for the Helpdesk API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};
use crate::widget::Sender;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";

/// `POST /chat/message` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// `POST /chat/message` response body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub reply: String,
    pub session_id: String,
}

/// One message of a stored transcript.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryMessage {
    pub id: String,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    messages: Vec<HistoryMessage>,
}

/// The HTTP surface the widget talks to.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn send_message(&self, request: &SendMessageRequest) -> Result<SendMessageResponse>;

    async fn history(&self, session_id: &str) -> Result<Vec<HistoryMessage>>;
}

/// [`ChatApi`] over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpChatApi {
    client: Client,
    base_url: String,
}

impl HttpChatApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for HttpChatApi {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp
        .text()
        .await
        .unwrap_or_else(|_| "<no body>".to_string());
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn send_message(&self, request: &SendMessageRequest) -> Result<SendMessageResponse> {
        let resp = self
            .client
            .post(format!("{}/chat/message", self.base_url))
            .json(request)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn history(&self, session_id: &str) -> Result<Vec<HistoryMessage>> {
        let resp = self
            .client
            .get(format!("{}/chat/history/{session_id}", self.base_url))
            .send()
            .await?;
        let body: HistoryResponse = check(resp).await?.json().await?;
        Ok(body.messages)
    }
}
