//! Helpdesk support chat API server.
//!
//! Every option can be given as a flag or through the environment (a `.env`
//! file in the working directory is loaded first).

use clap::Parser;
use helpdesk_api::config::{ApiConfig, DEFAULT_BIND_HOST, DEFAULT_MAX_CONNECTIONS, DEFAULT_PORT, RawConfig};
use tracing::info;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "helpdesk_server", about = "Helpdesk support chat API server", version)]
struct Args {
    /// Host to bind.
    #[arg(long, env = "BIND_HOST", default_value = DEFAULT_BIND_HOST)]
    host: String,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// PostgreSQL connection URL. Absent or placeholder selects in-memory storage.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    max_connections: u32,

    /// Redis URL for the cache gateway.
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// OpenAI API key. Absent selects fallback replies.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Completion model.
    #[arg(long, env = "OPENAI_MODEL")]
    openai_model: Option<String>,

    /// Completion API base URL.
    #[arg(long, env = "OPENAI_BASE_URL")]
    openai_base_url: Option<String>,

    /// Maximum reply length in tokens.
    #[arg(long, env = "MAX_TOKENS")]
    max_tokens: Option<u32>,
}

impl From<Args> for RawConfig {
    fn from(args: Args) -> Self {
        RawConfig {
            host: Some(args.host),
            port: Some(args.port),
            database_url: args.database_url,
            max_connections: Some(args.max_connections),
            redis_url: args.redis_url,
            openai_api_key: args.openai_api_key,
            openai_model: args.openai_model,
            openai_base_url: args.openai_base_url,
            max_tokens: args.max_tokens,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,helpdesk_api=debug,helpdesk_core=debug".into()),
        )
        .init();

    let config = ApiConfig::from_raw(Args::parse().into());

    info!(
        bind_addr = %config.bind_addr,
        persistent = config.store.is_persistent(),
        completion = config.openai.is_some(),
        cache = config.redis_url.is_some(),
        "starting helpdesk_server"
    );

    let state = helpdesk_api::AppState::from_config(&config).await?;
    let app = helpdesk_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
