//! Taleweave Engine -- the narrative generation server.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taleweave_engine::application::AppState;
use taleweave_engine::config::AppConfig;
use taleweave_engine::http;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taleweave_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting taleweave engine");

    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_addr;
    tracing::info!(prompts_dir = %config.prompts_dir, corpus = %config.trope_corpus_path, "configuration loaded");

    let state = Arc::new(AppState::new(config)?);
    tracing::info!("application state initialized");

    let app = Router::new()
        .route("/health", get(health_check))
        .nest("/api/narrative", http::create_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(%bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("failed to install ctrl-c handler");
        return;
    }
    tracing::info!("shutdown signal received");
}
