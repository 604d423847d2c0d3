//! REST API layer: identity extraction, route handlers, and router
//! composition.
//!
//! All endpoints are mounted under `/api/v1`; `/health` sits at the
//! root for load balancers.

pub mod auth;
pub mod groups;
pub mod pools;

use axum::Router;
use axum::routing::get;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let v1 = Router::new()
        .nest("/groups", groups::routes())
        .nest("/groups/{group_id}/pools", pools::group_routes())
        .nest("/pools", pools::routes());
    Router::new()
        .nest("/api/v1", v1)
        .route("/health", get(health))
}

/// `GET /health` — liveness probe.
async fn health() -> &'static str {
    "ok"
}
