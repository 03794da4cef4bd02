//! API server configuration.

use helpdesk_core::reply::OpenAiConfig;
use helpdesk_core::reply::openai::{DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use helpdesk_core::store::StoreConfig;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "0.0.0.0:3001").
    pub bind_addr: String,
    /// Persistent or ephemeral conversation storage.
    pub store: StoreConfig,
    /// Maximum number of database connections in the pool.
    pub max_connections: u32,
    /// Redis URL for the cache gateway. `None` disables the cache.
    pub redis_url: Option<String>,
    /// Completion service settings. `None` selects fallback-table mode.
    pub openai: Option<OpenAiConfig>,
}

/// Raw values as read from the environment or command line.
#[derive(Debug, Default, Clone)]
pub struct RawConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_url: Option<String>,
    pub max_connections: Option<u32>,
    pub redis_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub openai_base_url: Option<String>,
    pub max_tokens: Option<u32>,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                   | Default                     |
    /// |----------------------------|-----------------------------|
    /// | `BIND_HOST`                | `0.0.0.0`                   |
    /// | `PORT`                     | `3001`                      |
    /// | `DATABASE_URL`             | unset (in-memory store)     |
    /// | `DATABASE_MAX_CONNECTIONS` | `5`                         |
    /// | `REDIS_URL`                | unset (cache disabled)      |
    /// | `OPENAI_API_KEY`           | unset (fallback replies)    |
    /// | `OPENAI_MODEL`             | `gpt-3.5-turbo`             |
    /// | `OPENAI_BASE_URL`          | `https://api.openai.com/v1` |
    /// | `MAX_TOKENS`               | `500`                       |
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok();
        Self::from_raw(RawConfig {
            host: var("BIND_HOST"),
            port: var("PORT").and_then(|v| v.parse().ok()),
            database_url: var("DATABASE_URL"),
            max_connections: var("DATABASE_MAX_CONNECTIONS").and_then(|v| v.parse().ok()),
            redis_url: var("REDIS_URL"),
            openai_api_key: var("OPENAI_API_KEY"),
            openai_model: var("OPENAI_MODEL"),
            openai_base_url: var("OPENAI_BASE_URL"),
            max_tokens: var("MAX_TOKENS").and_then(|v| v.parse().ok()),
        })
    }

    /// Resolve raw values into a configuration, applying defaults.
    pub fn from_raw(raw: RawConfig) -> Self {
        let host = non_blank(raw.host).unwrap_or_else(|| DEFAULT_BIND_HOST.to_string());
        let port = raw.port.unwrap_or(DEFAULT_PORT);

        let openai = non_blank(raw.openai_api_key).map(|api_key| OpenAiConfig {
            api_key,
            base_url: non_blank(raw.openai_base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: non_blank(raw.openai_model).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: raw.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        });

        Self {
            bind_addr: format!("{host}:{port}"),
            store: StoreConfig::from_database_url(raw.database_url.as_deref()),
            max_connections: raw.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS),
            redis_url: non_blank(raw.redis_url),
            openai,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
