//! hydra-dex server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints and, when
//! enabled, the PostgreSQL persistence tasks.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use hydra_dex::api;
use hydra_dex::app_state::AppState;
use hydra_dex::config::{DexConfig, LogFormat};
use hydra_dex::persistence::{self, PostgresPersistence};
use hydra_dex::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = DexConfig::from_env().map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    tracing::info!(
        addr = %config.listen_addr,
        default_fee_bps = config.default_fee_bps,
        custody = %config.ledger_custody,
        "starting hydra-dex"
    );

    let event_store = if config.persistence_enabled {
        let store = PostgresPersistence::connect(&config)
            .await
            .context("connecting to PostgreSQL")?;
        Some(store)
    } else {
        tracing::info!("persistence disabled");
        None
    };

    let app_state =
        AppState::from_config(&config, event_store.clone()).context("building exchange state")?;

    if let Some(store) = event_store {
        if config.event_log_enabled {
            let _recorder = persistence::spawn_event_recorder(store.clone(), &app_state.event_bus);
        }
        let _snapshotter = persistence::spawn_snapshotter(
            store.clone(),
            Arc::clone(&app_state.dex),
            config.snapshot_interval_secs,
        );
        let _cleanup = persistence::spawn_snapshot_cleanup(store, config.cleanup_after_days);
    }

    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs.max(1),
        )))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
