//! Best-effort key/value cache gateway.
//!
//! Backed by Redis when a connection can be established at startup, otherwise
//! disabled. Every operation degrades to a miss or a no-op on failure; callers
//! never see a cache error.

use std::time::Duration;

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use thiserror::Error;
use tracing::{info, warn};

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Errors raised while connecting to the cache store.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Redis connection timed out after {0:?}")]
    ConnectTimeout(Duration),
}

#[derive(Clone)]
enum Backend {
    Redis(ConnectionManager),
    Disabled,
}

/// Optional cache accessor shared across requests.
#[derive(Clone)]
pub struct CacheGateway {
    backend: Backend,
}

impl std::fmt::Debug for CacheGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheGateway")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl CacheGateway {
    /// A gateway on which every operation is a miss/no-op.
    pub fn disabled() -> Self {
        Self {
            backend: Backend::Disabled,
        }
    }

    /// Connect to Redis at `url`.
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let manager = tokio::time::timeout(CONNECT_TIMEOUT, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::ConnectTimeout(CONNECT_TIMEOUT))??;
        Ok(Self {
            backend: Backend::Redis(manager),
        })
    }

    /// Connect if a URL is given, falling back to [`CacheGateway::disabled`]
    /// when it is absent or unreachable.
    pub async fn connect_or_disabled(url: Option<&str>) -> Self {
        let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
            info!("cache store not configured, cache disabled");
            return Self::disabled();
        };
        match Self::connect(url).await {
            Ok(gateway) => {
                info!("cache store connected");
                gateway
            }
            Err(e) => {
                warn!(error = %e, "cache store connection failed, cache disabled");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.backend, Backend::Redis(_))
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let Backend::Redis(conn) = &self.backend else {
            return None;
        };
        let mut conn = conn.clone();
        match conn.get::<_, Option<String>>(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "cache get failed");
                None
            }
        }
    }

    /// Store `value` for `ttl` (rounded down to whole seconds, minimum one).
    pub async fn set(&self, key: &str, value: &str, ttl: Duration) {
        let Backend::Redis(conn) = &self.backend else {
            return;
        };
        let mut conn = conn.clone();
        let seconds = ttl.as_secs().max(1);
        if let Err(e) = conn.set_ex::<_, _, ()>(key, value, seconds).await {
            warn!(key, error = %e, "cache set failed");
        }
    }

    pub async fn del(&self, key: &str) {
        let Backend::Redis(conn) = &self.backend else {
            return;
        };
        let mut conn = conn.clone();
        if let Err(e) = conn.del::<_, ()>(key).await {
            warn!(key, error = %e, "cache del failed");
        }
    }

    pub async fn exists(&self, key: &str) -> bool {
        let Backend::Redis(conn) = &self.backend else {
            return false;
        };
        let mut conn = conn.clone();
        match conn.exists::<_, bool>(key).await {
            Ok(found) => found,
            Err(e) => {
                warn!(key, error = %e, "cache exists failed");
                false
            }
        }
    }
}

impl Default for CacheGateway {
    fn default() -> Self {
        Self::disabled()
    }
}
