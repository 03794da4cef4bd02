//! # helpdesk_api
//!
//! HTTP API library for the Helpdesk support chat.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use helpdesk_core::cache::CacheGateway;
use helpdesk_core::chat::ChatService;
use helpdesk_core::reply::{OpenAiCompletion, ReplyGenerator};
use helpdesk_core::store::{
    ConversationStore, MemoryConversationStore, PgConversationStore, StoreConfig,
};
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::config::ApiConfig;
use crate::handlers::{chat, health};

pub const POST_CHAT_MESSAGE: &str = "/chat/message";
pub const GET_CHAT_HISTORY: &str = "/chat/history/{session_id}";
pub const GET_HEALTH: &str = "/health";

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Request orchestrator.
    pub chat: ChatService,
    /// Optional cache gateway. Not used on the chat path.
    pub cache: CacheGateway,
}

/// Failures while bringing up the service objects.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Database connection failed: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl AppState {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        replies: ReplyGenerator,
        cache: CacheGateway,
    ) -> Self {
        Self {
            chat: ChatService::new(store, Arc::new(replies)),
            cache,
        }
    }

    /// Build every long-lived service from configuration.
    ///
    /// A configured database that cannot be reached is fatal; the in-memory
    /// store is only used when no database was configured at all.
    pub async fn from_config(config: &ApiConfig) -> Result<Self, BootstrapError> {
        let store: Arc<dyn ConversationStore> = match &config.store {
            StoreConfig::Persistent { url } => {
                info!(
                    max_connections = config.max_connections,
                    "connecting to PostgreSQL"
                );
                let pool = PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .acquire_timeout(Duration::from_secs(30))
                    .connect(url)
                    .await?;
                info!("running database migrations");
                helpdesk_core::migrate::migrate(&pool).await?;
                Arc::new(PgConversationStore::new(pool))
            }
            StoreConfig::Ephemeral => {
                warn!("database not configured, using in-memory storage (data will not persist)");
                Arc::new(MemoryConversationStore::new())
            }
        };

        let replies = match &config.openai {
            Some(openai) => {
                info!(model = %openai.model, max_tokens = openai.max_tokens, "completion service configured");
                ReplyGenerator::with_completion(Arc::new(OpenAiCompletion::new(openai.clone())))
            }
            None => {
                warn!("OpenAI API key not configured, replies will use the fallback table");
                ReplyGenerator::fallback_only()
            }
        };

        let cache = CacheGateway::connect_or_disabled(config.redis_url.as_deref()).await;

        Ok(Self::new(store, replies, cache))
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(POST_CHAT_MESSAGE, post(chat::send_message_handler))
        .route(GET_CHAT_HISTORY, get(chat::history_handler))
        .route("/chat/history", get(chat::missing_session_handler))
        .route("/chat/history/", get(chat::missing_session_handler))
        .route(GET_HEALTH, get(health::health_handler))
        .layer(cors)
        .with_state(state)
}
