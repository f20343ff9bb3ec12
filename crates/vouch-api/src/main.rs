//! # vouch-api: Binary Entry Point
//!
//! Loads configuration from the environment, connects the user directory and
//! the credential store (falling back to in-memory backends when their URLs
//! are unset), and serves the router until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use vouch_api::config::{AppConfig, LogFormat};
use vouch_api::state::AppState;
use vouch_api::users::memory::MemoryUserDirectory;
use vouch_api::users::postgres::{init_pool, PgUserDirectory};
use vouch_api::users::UserDirectory;
use vouch_token::{CredentialStore, MemoryStore, RedisStore, SystemClock};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    init_tracing(config.log_format);
    tracing::info!(mode = ?config.mode, "configuration loaded");

    let users: Arc<dyn UserDirectory> = match &config.database_url {
        Some(url) => {
            let pool = init_pool(url, config.mode)
                .await
                .context("database initialization failed")?;
            tracing::info!("user directory: postgres");
            Arc::new(PgUserDirectory::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; users are kept in memory and lost on restart");
            Arc::new(MemoryUserDirectory::new())
        }
    };

    let store: Arc<dyn CredentialStore> = match &config.redis_url {
        Some(url) => {
            let store = RedisStore::connect(url)
                .await
                .context("redis connection failed")?;
            tracing::info!("credential store: redis");
            Arc::new(store)
        }
        None => {
            tracing::warn!("REDIS_URL not set; refresh credentials are kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::new(&config, store, users, Arc::new(SystemClock))
        .context("state initialization failed")?;
    let app = vouch_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("vouch-api listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
