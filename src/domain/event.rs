//! Group-scoped events broadcast over WebSocket.
//!
//! Every committed state change is announced to the owning group's room
//! as a [`GroupEvent`]. The wire shape is
//! `{"type": <string>, "payload": <object>}`, produced by the serde
//! tag/content attributes below.

use serde::Serialize;

use super::pool::PoolView;
use super::{BetId, GroupId, PoolId, UserId};

/// A typed event, serialized once per broadcast and fanned out to every
/// session in the group's room.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum GroupEvent {
    /// A user joined the group via invite code.
    MemberJoined {
        /// The group joined.
        group_id: GroupId,
        /// The new member.
        user_id: UserId,
    },

    /// An admin granted (or deducted) points.
    PointsGranted {
        /// The group.
        group_id: GroupId,
        /// The affected member.
        user_id: UserId,
        /// Signed amount granted.
        amount: i64,
    },

    /// A member was removed from the group.
    MemberKicked {
        /// The group.
        group_id: GroupId,
        /// The removed member.
        user_id: UserId,
    },

    /// A new pool opened for bets. Carries the full pool with options.
    PoolCreated {
        /// The new pool.
        pool: PoolView,
    },

    /// A bet was placed. Amounts are intentionally omitted; clients
    /// refetch the pool for totals.
    BetPlaced {
        /// The pool bet on.
        pool_id: PoolId,
        /// The betting user.
        user_id: UserId,
        /// The new bet.
        bet_id: BetId,
    },

    /// A pool stopped accepting bets.
    PoolLocked {
        /// The locked pool.
        pool_id: PoolId,
    },

    /// A pool was resolved and the pot distributed. Carries the full
    /// pool so clients can render the outcome without a refetch.
    PoolResolved {
        /// The resolved pool, including `winning_option_id`.
        pool: PoolView,
    },

    /// A pool was cancelled and all bets refunded.
    PoolCancelled {
        /// The cancelled pool.
        pool_id: PoolId,
    },
}

impl GroupEvent {
    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::MemberJoined { .. } => "member_joined",
            Self::PointsGranted { .. } => "points_granted",
            Self::MemberKicked { .. } => "member_kicked",
            Self::PoolCreated { .. } => "pool_created",
            Self::BetPlaced { .. } => "bet_placed",
            Self::PoolLocked { .. } => "pool_locked",
            Self::PoolResolved { .. } => "pool_resolved",
            Self::PoolCancelled { .. } => "pool_cancelled",
        }
    }
}
