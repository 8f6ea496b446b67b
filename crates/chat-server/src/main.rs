//! coin-chat HTTP Server
//!
//! Axum-based conversation host. Owns sessions (conversation history and
//! holdings), runs one turn per message through the assistant, and
//! persists the session after every turn.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chat_core::{Assistant, FileSessionStore, MemorySessionStore, SessionStore};
use market_data::{CoinGeckoClient, MarketDataGateway, MockMarketData};

use crate::config::{MarketDataSource, ServerConfig};
use crate::handlers::{
    chat_handler, delete_session, get_session, health_check, list_sessions, replace_holdings,
};
use crate::state::AppState;

/// All routes with CORS and request tracing
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat_handler))
        .route("/api/sessions", get(list_sessions))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/sessions/{id}/holdings", put(replace_holdings))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment first so RUST_LOG from .env applies
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    let gateway: Arc<dyn MarketDataGateway> = match config.market_data {
        MarketDataSource::CoinGecko => Arc::new(CoinGeckoClient::from_env()?),
        MarketDataSource::Mock => Arc::new(MockMarketData::new()),
    };

    if gateway.health_check().await {
        tracing::info!(gateway = gateway.name(), "Market data reachable");
    } else {
        tracing::warn!(
            gateway = gateway.name(),
            "Market data not reachable, replies will report errors"
        );
    }

    let store: Arc<dyn SessionStore> = match &config.session_dir {
        Some(dir) => Arc::new(FileSessionStore::open(dir)?),
        None => {
            tracing::info!("SESSION_DIR not set, sessions are kept in memory");
            Arc::new(MemorySessionStore::new())
        }
    };

    tracing::info!(
        default_coin = %config.assistant.default_coin,
        chart_days = config.assistant.chart_days,
        policy = ?config.assistant.resolution_policy,
        "Assistant configured"
    );
    let assistant = Arc::new(Assistant::new(gateway, config.assistant.clone())?);

    let app = build_router(AppState::new(assistant, store));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("coin-chat server running on http://{}", config.bind_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET    /health                     - Health check");
    tracing::info!("  POST   /api/chat                   - Send message");
    tracing::info!("  GET    /api/sessions               - List sessions");
    tracing::info!("  GET    /api/sessions/{{id}}          - Get session");
    tracing::info!("  PUT    /api/sessions/{{id}}/holdings - Replace holdings");
    tracing::info!("  DELETE /api/sessions/{{id}}          - Delete session");

    axum::serve(listener, app).await?;

    Ok(())
}
