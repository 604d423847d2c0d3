//! groupbets server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use groupbets::api;
use groupbets::app_state::AppState;
use groupbets::config::ServerConfig;
use groupbets::service::{GroupService, PoolService};
use groupbets::store::Store;
use groupbets::ws::Hub;
use groupbets::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = ServerConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting groupbets");

    // Open the database and apply the schema
    let store = Store::open(&config.database_url, config.database_max_connections).await?;
    store.migrate().await?;

    // Build service layer
    let groups = Arc::new(GroupService::new(store.clone()));
    let pools = Arc::new(PoolService::new(store));
    let hub = Arc::new(Hub::new(config.hub_queue_capacity));

    // Build application state
    let app_state = AppState { groups, pools, hub };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws/groups/{group_id}", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
