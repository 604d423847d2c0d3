//! Axum WebSocket upgrade handler.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

use super::session;
use crate::api::auth::Actor;
use crate::app_state::AppState;
use crate::domain::{GroupId, SessionId};
use crate::error::ServiceError;

/// `GET /ws/groups/{group_id}` — upgrade to a group event stream.
///
/// Membership is checked before the upgrade so non-members get a plain
/// HTTP error instead of a WebSocket handshake.
///
/// # Errors
///
/// [`ServiceError::NotAMember`] when the actor does not belong to the
/// group, or [`ServiceError::Storage`] on lookup failure.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
    actor: Actor,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .groups
        .member(group_id, actor.user_id)
        .await?
        .ok_or(ServiceError::NotAMember)?;

    let hub = std::sync::Arc::clone(&state.hub);
    Ok(ws.on_upgrade(move |socket| {
        let session_id = SessionId::new();
        let rx = hub.register(group_id, session_id);
        tracing::debug!(%group_id, %session_id, user_id = %actor.user_id, "ws session opened");
        session::serve(socket, hub, group_id, session_id, rx)
    }))
}
