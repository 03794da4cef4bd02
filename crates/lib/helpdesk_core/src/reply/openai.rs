//! OpenAI chat-completions client.
//!
//! Single attempt per call: retrying would defeat the throttle, and every
//! failure already has a degraded reply.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{Completion, CompletionError, CompletionRequest, CompletionService};
use crate::models::{HistoryTurn, TokenUsage};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 500;
const TEMPERATURE: f32 = 0.7;

/// Connection settings for [`OpenAiCompletion`].
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [HistoryTurn],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// [`CompletionService`] backed by the OpenAI HTTP API.
#[derive(Debug, Clone)]
pub struct OpenAiCompletion {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiCompletion {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

fn classify_status(status: StatusCode, body: String) -> CompletionError {
    match status {
        StatusCode::UNAUTHORIZED => CompletionError::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS => CompletionError::RateLimited,
        s if s.is_server_error() => CompletionError::Unavailable(s.as_u16()),
        s => CompletionError::Rejected {
            status: s.as_u16(),
            body,
        },
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, CompletionError> {
        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&ChatCompletionRequest {
                model: &self.config.model,
                messages: &request.messages,
                max_tokens: self.config.max_tokens,
                temperature: TEMPERATURE,
            })
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(classify_status(status, body));
        }

        let data: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;

        let content = data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.is_empty());

        Ok(Completion {
            content,
            usage: data.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}
