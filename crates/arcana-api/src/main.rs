//! Arcana API Server -- HTTP entry point for the divination platform
//!
//! Loads configuration from the environment, initialises tracing, builds
//! the application state (engines, cache, optional persistence) and serves
//! the Axum router.

use arcana_api::{build_app_state, create_router, init_tracing, init_tracing_json, ServiceConfig};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    let config = ServiceConfig::from_env();

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    if config.log_format == "json" {
        init_tracing_json(&config.log_level);
    } else {
        init_tracing(&config.log_level);
    }

    tracing::info!("Starting Arcana API server");
    if config.redis_url.is_some() {
        tracing::info!("Redis cache enabled");
    } else {
        tracing::info!("Redis cache disabled (in-memory only)");
    }
    if config.database_url.is_none() {
        tracing::info!("Persistence disabled (no DATABASE_URL)");
    }

    let state = build_app_state(&config).await;
    tracing::info!(
        engines = state.orchestrator.registry().len(),
        "Application state initialized"
    );

    let app = create_router(state);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await.unwrap_or_else(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
        std::process::exit(1);
    });

    tracing::info!("Arcana API server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await.expect("Server error");
}
