//! Server error types with HTTP status code mapping.
//!
//! [`ServiceError`] is the central error type. Ledger operations return it
//! synchronously from inside their enclosing transaction; the transaction
//! is rolled back on any error so no partial mutation is ever observable.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::domain::{GroupId, OptionId, PoolId, PoolStatus, UserId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4003,
///     "message": "insufficient points (have 50, need 200)",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`ServiceError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category               | HTTP Status                 |
/// |-----------|------------------------|-----------------------------|
/// | 1000–1999 | Validation             | 400 Bad Request             |
/// | 2000–2999 | Not Found              | 404 Not Found               |
/// | 3000–3999 | Server                 | 500 Internal Server Error   |
/// | 4000–4999 | Ledger/Domain          | 401 / 403 / 409 / 422       |
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Request validation failed (malformed input, wrong option, ...).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Group with the given ID was not found.
    #[error("group not found: {0}")]
    GroupNotFound(GroupId),

    /// Pool with the given ID was not found.
    #[error("pool not found: {0}")]
    PoolNotFound(PoolId),

    /// Group member row for the target user was not found.
    #[error("user {user_id} is not a member of group {group_id}")]
    MemberNotFound {
        /// Group searched.
        group_id: GroupId,
        /// Target user.
        user_id: UserId,
    },

    /// No group carries the given invite code.
    #[error("invalid invite code")]
    InvalidInviteCode,

    /// Operation is illegal for the pool's current status.
    #[error("pool is {status}")]
    InvalidState {
        /// Current pool status.
        status: PoolStatus,
    },

    /// The user already has a bet on this pool (one bet per user per pool).
    #[error("a bet has already been placed on this pool")]
    DuplicateBet,

    /// The member's balance is too low for the wager.
    #[error("insufficient points (have {have}, need {need})")]
    InsufficientPoints {
        /// Current balance.
        have: i64,
        /// Requested wager.
        need: i64,
    },

    /// The acting user is not a member of the pool's group.
    #[error("not a member of this group")]
    NotAMember,

    /// The actor lacks the required role or ownership.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// No acting user could be resolved from the request.
    #[error("not authenticated")]
    Unauthenticated,

    /// The requested winning option does not exist in the pool.
    #[error("option {0} does not belong to this pool")]
    OptionNotInPool(OptionId),

    /// Storage layer failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::OptionNotInPool(_) => 1002,
            Self::GroupNotFound(_) => 2001,
            Self::PoolNotFound(_) => 2002,
            Self::MemberNotFound { .. } => 2003,
            Self::InvalidInviteCode => 2004,
            Self::Internal(_) => 3000,
            Self::Storage(_) => 3001,
            Self::InvalidState { .. } => 4001,
            Self::DuplicateBet => 4002,
            Self::InsufficientPoints { .. } => 4003,
            Self::NotAMember => 4004,
            Self::PermissionDenied(_) => 4005,
            Self::Unauthenticated => 4006,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::OptionNotInPool(_) => StatusCode::BAD_REQUEST,
            Self::GroupNotFound(_)
            | Self::PoolNotFound(_)
            | Self::MemberNotFound { .. }
            | Self::InvalidInviteCode => StatusCode::NOT_FOUND,
            Self::InvalidState { .. } | Self::DuplicateBet => StatusCode::CONFLICT,
            Self::InsufficientPoints { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotAMember | Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
