//! Pool lifecycle and betting handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::api::auth::Actor;
use crate::api::groups::require_member;
use crate::app_state::AppState;
use crate::domain::{GroupEvent, GroupId, OptionId, PoolId, PoolStatus};
use crate::error::ServiceError;
use crate::service::{CreatePoolRequest, PlaceBetRequest};

/// Routes mounted under `/api/v1/groups/{group_id}/pools`.
pub fn group_routes() -> Router<AppState> {
    Router::new().route("/", post(create_pool).get(list_pools))
}

/// Routes mounted under `/api/v1/pools`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{pool_id}", get(get_pool))
        .route("/{pool_id}/bets", post(place_bet))
        .route("/{pool_id}/lock", post(lock_pool))
        .route("/{pool_id}/resolve", post(resolve_pool))
        .route("/{pool_id}/cancel", post(cancel_pool))
}

/// Optional status filter for pool listings.
#[derive(Debug, Deserialize)]
struct PoolFilter {
    status: Option<PoolStatus>,
}

/// Body for resolving a pool.
#[derive(Debug, Deserialize)]
struct ResolvePoolRequest {
    winning_option_id: OptionId,
}

/// Resolves the pool's owning group and the actor's admin flag. Every
/// pool-keyed endpoint funnels through here so permission checks see
/// the same membership row the service will.
async fn pool_membership(
    state: &AppState,
    pool_id: PoolId,
    actor: Actor,
) -> Result<(GroupId, bool), ServiceError> {
    let view = state.pools.get_pool(pool_id).await?;
    let member = require_member(state, view.pool.group_id, actor).await?;
    Ok((view.pool.group_id, member.role.is_admin()))
}

/// `POST /groups/{group_id}/pools` — open a new pool.
///
/// # Errors
///
/// Returns [`ServiceError::NotAMember`] for non-members or
/// [`ServiceError::InvalidRequest`] for bad input.
async fn create_pool(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
    actor: Actor,
    Json(req): Json<CreatePoolRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    require_member(&state, group_id, actor).await?;
    let view = state.pools.create_pool(group_id, actor.user_id, req).await?;
    state
        .hub
        .broadcast_to_group(group_id, &GroupEvent::PoolCreated { pool: view.clone() });
    Ok((StatusCode::CREATED, Json(view)))
}

/// `GET /groups/{group_id}/pools` — list pools, optionally by status.
///
/// # Errors
///
/// Returns [`ServiceError::NotAMember`] for non-members.
async fn list_pools(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
    Query(filter): Query<PoolFilter>,
    actor: Actor,
) -> Result<impl IntoResponse, ServiceError> {
    require_member(&state, group_id, actor).await?;
    let pools = state.pools.list_pools(group_id, filter.status).await?;
    Ok(Json(pools))
}

/// `GET /pools/{pool_id}` — pool detail with options and bets.
///
/// # Errors
///
/// Returns [`ServiceError::PoolNotFound`] or
/// [`ServiceError::NotAMember`].
async fn get_pool(
    State(state): State<AppState>,
    Path(pool_id): Path<PoolId>,
    actor: Actor,
) -> Result<impl IntoResponse, ServiceError> {
    let view = state.pools.get_pool(pool_id).await?;
    require_member(&state, view.pool.group_id, actor).await?;
    Ok(Json(view))
}

/// `POST /pools/{pool_id}/bets` — place a wager on an option.
///
/// # Errors
///
/// Returns [`ServiceError`] per the betting rules: pool not open,
/// duplicate bet, insufficient balance, or option mismatch.
async fn place_bet(
    State(state): State<AppState>,
    Path(pool_id): Path<PoolId>,
    actor: Actor,
    Json(req): Json<PlaceBetRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let (group_id, _) = pool_membership(&state, pool_id, actor).await?;
    let bet = state.pools.place_bet(pool_id, actor.user_id, req).await?;
    state.hub.broadcast_to_group(
        group_id,
        &GroupEvent::BetPlaced {
            pool_id,
            user_id: actor.user_id,
            bet_id: bet.id,
        },
    );
    Ok((StatusCode::CREATED, Json(bet)))
}

/// `POST /pools/{pool_id}/lock` — stop accepting bets.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidState`] unless the pool is open, or
/// [`ServiceError::PermissionDenied`] for members who are neither the
/// creator nor an admin.
async fn lock_pool(
    State(state): State<AppState>,
    Path(pool_id): Path<PoolId>,
    actor: Actor,
) -> Result<impl IntoResponse, ServiceError> {
    let (group_id, is_admin) = pool_membership(&state, pool_id, actor).await?;
    let pool = state.pools.lock_pool(pool_id, actor.user_id, is_admin).await?;
    state
        .hub
        .broadcast_to_group(group_id, &GroupEvent::PoolLocked { pool_id });
    Ok(Json(pool))
}

/// `POST /pools/{pool_id}/resolve` — pick the winner and pay out.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidState`] unless the pool is open or
/// locked, [`ServiceError::OptionNotInPool`] for a foreign option, or
/// [`ServiceError::PermissionDenied`].
async fn resolve_pool(
    State(state): State<AppState>,
    Path(pool_id): Path<PoolId>,
    actor: Actor,
    Json(req): Json<ResolvePoolRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let (group_id, is_admin) = pool_membership(&state, pool_id, actor).await?;
    let view = state
        .pools
        .resolve_pool(pool_id, req.winning_option_id, actor.user_id, is_admin)
        .await?;
    state
        .hub
        .broadcast_to_group(group_id, &GroupEvent::PoolResolved { pool: view.clone() });
    Ok(Json(view))
}

/// `POST /pools/{pool_id}/cancel` — void the pool and refund wagers.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidState`] for terminal pools or
/// [`ServiceError::PermissionDenied`].
async fn cancel_pool(
    State(state): State<AppState>,
    Path(pool_id): Path<PoolId>,
    actor: Actor,
) -> Result<impl IntoResponse, ServiceError> {
    let (group_id, is_admin) = pool_membership(&state, pool_id, actor).await?;
    let pool = state.pools.cancel_pool(pool_id, actor.user_id, is_admin).await?;
    state
        .hub
        .broadcast_to_group(group_id, &GroupEvent::PoolCancelled { pool_id });
    Ok(Json(pool))
}
