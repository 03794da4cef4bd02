//! Reply generation: turns conversation history plus the latest user message
//! into the assistant's reply.
//!
//! Two paths:
//!
//! - external: a [`CompletionService`] (OpenAI in production), gated by a
//!   process-wide [`Throttle`]
//! - fallback: the static keyword table in [`fallback`]
//!
//! [`ReplyGenerator::generate_reply`] cannot fail. Every failure of the
//! external path is folded into [`Reply::Degraded`] with substitute text.

pub mod fallback;
pub mod openai;
pub mod prompt;
pub mod throttle;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::models::{HistoryTurn, Role, TokenUsage};

pub use fallback::fallback_reply;
pub use openai::{OpenAiCompletion, OpenAiConfig};
pub use throttle::Throttle;

pub const CONFIGURATION_ISSUE_REPLY: &str = "Sorry, there's a configuration issue with our AI service. Please try again later or contact support.";
pub const HIGH_TRAFFIC_REPLY: &str =
    "I'm experiencing high traffic right now. Please try again in a moment.";
pub const UNAVAILABLE_REPLY: &str =
    "Our AI service is temporarily unavailable. Please try again later.";
pub const EMPTY_COMPLETION_REPLY: &str = "Sorry, I couldn't generate a response.";

/// Messages sent to a completion service, system instruction first.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<HistoryTurn>,
}

/// Raw output of a completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// `None` when the service returned no usable choice.
    pub content: Option<String>,
    pub usage: Option<TokenUsage>,
}

/// Failure modes of a completion call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("completion service rejected the credential")]
    Unauthorized,

    #[error("completion service rate limit reached")]
    RateLimited,

    #[error("completion service unavailable (HTTP {0})")]
    Unavailable(u16),

    #[error("completion service rejected the request (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("completion request failed: {0}")]
    Transport(String),

    #[error("completion response could not be parsed: {0}")]
    Malformed(String),
}

/// A chat-completion backend.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, CompletionError>;

    /// Identifier for logging.
    fn name(&self) -> &str;
}

/// Why a reply did not come from the completion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradedReason {
    /// No completion service configured.
    NotConfigured,
    /// Previous external call was too recent.
    Throttled,
    /// Credential rejected.
    Unauthorized,
    /// Service signalled a rate limit.
    RateLimited,
    /// Service returned a 5xx.
    Unavailable,
    /// Any other failure.
    Failed,
}

/// Outcome of reply generation. Always resolvable to display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Generated {
        text: String,
        usage: Option<TokenUsage>,
    },
    Degraded {
        reason: DegradedReason,
        text: String,
    },
}

impl Reply {
    fn degraded(reason: DegradedReason, text: impl Into<String>) -> Self {
        Reply::Degraded {
            reason,
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Reply::Generated { text, .. } | Reply::Degraded { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Reply::Generated { text, .. } | Reply::Degraded { text, .. } => text,
        }
    }

    pub fn usage(&self) -> Option<TokenUsage> {
        match self {
            Reply::Generated { usage, .. } => *usage,
            Reply::Degraded { .. } => None,
        }
    }

    pub fn degraded_reason(&self) -> Option<DegradedReason> {
        match self {
            Reply::Generated { .. } => None,
            Reply::Degraded { reason, .. } => Some(*reason),
        }
    }
}

/// Long-lived reply generator shared by all requests.
pub struct ReplyGenerator {
    completion: Option<Arc<dyn CompletionService>>,
    throttle: Throttle,
}

impl ReplyGenerator {
    /// Generator that only ever answers from the keyword table.
    pub fn fallback_only() -> Self {
        Self {
            completion: None,
            throttle: Throttle::default(),
        }
    }

    /// Generator backed by a completion service with the default throttle.
    pub fn with_completion(completion: Arc<dyn CompletionService>) -> Self {
        Self::new(Some(completion), Throttle::default())
    }

    pub fn new(completion: Option<Arc<dyn CompletionService>>, throttle: Throttle) -> Self {
        Self {
            completion,
            throttle,
        }
    }

    pub fn is_external(&self) -> bool {
        self.completion.is_some()
    }

    /// Produce a reply for `new_message` given the prior turns in `history`.
    pub async fn generate_reply(&self, history: &[HistoryTurn], new_message: &str) -> Reply {
        let Some(completion) = &self.completion else {
            return Reply::degraded(DegradedReason::NotConfigured, fallback_reply(new_message));
        };

        if !self.throttle.try_acquire().await {
            debug!(
                min_interval_ms = self.throttle.min_interval().as_millis() as u64,
                "completion call throttled, using fallback table"
            );
            return Reply::degraded(DegradedReason::Throttled, fallback_reply(new_message));
        }

        let request = build_request(history, new_message);
        match completion.complete(&request).await {
            Ok(done) => {
                if let Some(usage) = &done.usage {
                    debug!(
                        service = completion.name(),
                        prompt_tokens = usage.prompt_tokens,
                        completion_tokens = usage.completion_tokens,
                        total_tokens = usage.total_tokens,
                        "completion succeeded"
                    );
                }
                Reply::Generated {
                    text: done
                        .content
                        .unwrap_or_else(|| EMPTY_COMPLETION_REPLY.to_string()),
                    usage: done.usage,
                }
            }
            Err(e) => degrade(completion.name(), e, new_message),
        }
    }
}

fn degrade(service: &str, e: CompletionError, new_message: &str) -> Reply {
    match e {
        CompletionError::Unauthorized => {
            error!(service, "completion credential rejected");
            Reply::degraded(DegradedReason::Unauthorized, CONFIGURATION_ISSUE_REPLY)
        }
        CompletionError::RateLimited => {
            warn!(service, "completion service rate limited");
            Reply::degraded(DegradedReason::RateLimited, HIGH_TRAFFIC_REPLY)
        }
        CompletionError::Unavailable(status) => {
            warn!(service, status, "completion service unavailable");
            Reply::degraded(DegradedReason::Unavailable, UNAVAILABLE_REPLY)
        }
        other => {
            error!(service, error = %other, "completion failed, using fallback table");
            Reply::degraded(DegradedReason::Failed, fallback_reply(new_message))
        }
    }
}

/// System instruction, then prior turns, then the new message.
pub fn build_request(history: &[HistoryTurn], new_message: &str) -> CompletionRequest {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(HistoryTurn {
        role: Role::System,
        content: prompt::SYSTEM_PROMPT.to_string(),
    });
    messages.extend_from_slice(history);
    messages.push(HistoryTurn {
        role: Role::User,
        content: new_message.to_string(),
    });
    CompletionRequest { messages }
}
