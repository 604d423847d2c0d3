//! Group and membership handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::api::auth::Actor;
use crate::app_state::AppState;
use crate::domain::{Group, GroupEvent, GroupId, GroupMember, UserId};
use crate::error::ServiceError;
use crate::service::{CreateGroupRequest, GrantPointsRequest, JoinGroupRequest};

/// Routes mounted under `/api/v1/groups`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_group).get(list_my_groups))
        .route("/join", post(join_group))
        .route("/{group_id}", get(get_group).delete(delete_group))
        .route("/{group_id}/points", post(grant_points))
        .route("/{group_id}/leaderboard", get(leaderboard))
        .route("/{group_id}/history", get(points_history))
        .route("/{group_id}/invite", post(regenerate_invite_code))
        .route("/{group_id}/members/{user_id}", delete(kick_member))
}

/// Requires the actor to be a member; returns their membership row.
pub(crate) async fn require_member(
    state: &AppState,
    group_id: GroupId,
    actor: Actor,
) -> Result<GroupMember, ServiceError> {
    state
        .groups
        .member(group_id, actor.user_id)
        .await?
        .ok_or(ServiceError::NotAMember)
}

/// Requires the actor to be a group admin.
async fn require_admin(
    state: &AppState,
    group_id: GroupId,
    actor: Actor,
) -> Result<GroupMember, ServiceError> {
    let member = require_member(state, group_id, actor).await?;
    if !member.role.is_admin() {
        return Err(ServiceError::PermissionDenied(
            "requires group admin".into(),
        ));
    }
    Ok(member)
}

/// Group with its members in leaderboard order.
#[derive(Debug, Serialize)]
struct GroupDetailResponse {
    #[serde(flatten)]
    group: Group,
    members: Vec<GroupMember>,
}

/// Outcome of a join request.
#[derive(Debug, Serialize)]
struct JoinGroupResponse {
    #[serde(flatten)]
    group: Group,
    /// `false` when the caller was already a member.
    joined: bool,
}

/// A freshly rotated invite code.
#[derive(Debug, Serialize)]
struct InviteCodeResponse {
    invite_code: String,
}

fn default_history_limit() -> i64 {
    50
}

/// Pagination and filter parameters for the points history.
#[derive(Debug, Deserialize)]
struct HistoryParams {
    /// Restrict to one member's entries.
    user_id: Option<UserId>,
    #[serde(default = "default_history_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

/// `POST /groups` — create a group with the caller as admin.
///
/// # Errors
///
/// Returns [`ServiceError`] on invalid input or storage failure.
async fn create_group(
    State(state): State<AppState>,
    actor: Actor,
    Json(req): Json<CreateGroupRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let group = state.groups.create_group(actor.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

/// `POST /groups/join` — join a group by invite code.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidInviteCode`] for an unknown code.
async fn join_group(
    State(state): State<AppState>,
    actor: Actor,
    Json(req): Json<JoinGroupRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let (group, joined) = state.groups.join_group(actor.user_id, req).await?;
    if joined {
        state.hub.broadcast_to_group(
            group.id,
            &GroupEvent::MemberJoined {
                group_id: group.id,
                user_id: actor.user_id,
            },
        );
    }
    Ok(Json(JoinGroupResponse { group, joined }))
}

/// `GET /groups/{group_id}` — group detail with members.
///
/// # Errors
///
/// Returns [`ServiceError::NotAMember`] for non-members.
async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
    actor: Actor,
) -> Result<impl IntoResponse, ServiceError> {
    require_member(&state, group_id, actor).await?;
    let (group, members) = state.groups.get_group(group_id).await?;
    Ok(Json(GroupDetailResponse { group, members }))
}

/// `DELETE /groups/{group_id}` — delete a group and all its data.
///
/// # Errors
///
/// Returns [`ServiceError::PermissionDenied`] for non-admins.
async fn delete_group(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
    actor: Actor,
) -> Result<impl IntoResponse, ServiceError> {
    require_admin(&state, group_id, actor).await?;
    state.groups.delete_group(group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /groups/{group_id}/points` — admin grant or deduction.
///
/// # Errors
///
/// Returns [`ServiceError::PermissionDenied`] for non-admins or
/// [`ServiceError::MemberNotFound`] for an unknown target.
async fn grant_points(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
    actor: Actor,
    Json(req): Json<GrantPointsRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    require_admin(&state, group_id, actor).await?;
    let (user_id, amount) = (req.user_id, req.amount);
    state.groups.grant_points(group_id, req).await?;
    state.hub.broadcast_to_group(
        group_id,
        &GroupEvent::PointsGranted {
            group_id,
            user_id,
            amount,
        },
    );
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /groups/{group_id}/leaderboard` — members by balance.
///
/// # Errors
///
/// Returns [`ServiceError::NotAMember`] for non-members.
async fn leaderboard(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
    actor: Actor,
) -> Result<impl IntoResponse, ServiceError> {
    require_member(&state, group_id, actor).await?;
    let members = state.groups.leaderboard(group_id).await?;
    Ok(Json(members))
}

/// `GET /groups` — list the groups the caller belongs to.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on lookup failure.
async fn list_my_groups(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<impl IntoResponse, ServiceError> {
    let groups = state.groups.groups_for_user(actor.user_id).await?;
    Ok(Json(groups))
}

/// `GET /groups/{group_id}/history` — paginated points log, newest
/// first, optionally filtered to one member.
///
/// # Errors
///
/// Returns [`ServiceError::NotAMember`] for non-members.
async fn points_history(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
    Query(params): Query<HistoryParams>,
    actor: Actor,
) -> Result<impl IntoResponse, ServiceError> {
    require_member(&state, group_id, actor).await?;
    let page = state
        .groups
        .points_history(group_id, params.user_id, params.limit, params.offset)
        .await?;
    Ok(Json(page))
}

/// `POST /groups/{group_id}/invite` — rotate the invite code.
///
/// # Errors
///
/// Returns [`ServiceError::PermissionDenied`] for non-admins.
async fn regenerate_invite_code(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
    actor: Actor,
) -> Result<impl IntoResponse, ServiceError> {
    require_admin(&state, group_id, actor).await?;
    let invite_code = state.groups.regenerate_invite_code(group_id).await?;
    Ok(Json(InviteCodeResponse { invite_code }))
}

/// `DELETE /groups/{group_id}/members/{user_id}` — remove a member.
///
/// Admins can remove anyone; a regular member may only remove
/// themselves (leaving the group).
///
/// # Errors
///
/// Returns [`ServiceError::PermissionDenied`] when a non-admin targets
/// someone else.
async fn kick_member(
    State(state): State<AppState>,
    Path((group_id, user_id)): Path<(GroupId, UserId)>,
    actor: Actor,
) -> Result<impl IntoResponse, ServiceError> {
    let member = require_member(&state, group_id, actor).await?;
    if user_id != actor.user_id && !member.role.is_admin() {
        return Err(ServiceError::PermissionDenied(
            "requires group admin".into(),
        ));
    }
    state.groups.kick_member(group_id, user_id).await?;
    state
        .hub
        .broadcast_to_group(group_id, &GroupEvent::MemberKicked { group_id, user_id });
    Ok(StatusCode::NO_CONTENT)
}
