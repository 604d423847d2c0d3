//! Prediction pools, options, and bets.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BetId, GroupId, OptionId, PoolId, UserId};

/// Lifecycle status of a pool.
///
/// Transitions are strictly forward: `open → {locked, resolved,
/// cancelled}`, `locked → {resolved, cancelled}`. `resolved` and
/// `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PoolStatus {
    /// Accepting bets.
    Open,
    /// Closed for bets, awaiting resolution.
    Locked,
    /// Settled with a winning option. Terminal.
    Resolved,
    /// Cancelled with all bets refunded. Terminal.
    Cancelled,
}

impl PoolStatus {
    /// Whether bets may still be placed.
    #[must_use]
    pub const fn accepts_bets(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Whether the pool may still be resolved or cancelled.
    #[must_use]
    pub const fn is_settleable(&self) -> bool {
        matches!(self, Self::Open | Self::Locked)
    }

    /// Whether this status is terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Cancelled)
    }
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Locked => "locked",
            Self::Resolved => "resolved",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// A single prediction market with mutually exclusive options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool {
    /// Pool identifier.
    pub id: PoolId,
    /// Owning group.
    pub group_id: GroupId,
    /// Short title (e.g. the question being predicted).
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Current lifecycle status.
    pub status: PoolStatus,
    /// User who created the pool.
    pub created_by: UserId,
    /// Winning option, set once when the pool is resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winning_option_id: Option<OptionId>,
    /// Resolution timestamp, set only on resolve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// One option within a pool. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolOption {
    /// Option identifier.
    pub id: OptionId,
    /// Owning pool.
    pub pool_id: PoolId,
    /// Display label.
    pub label: String,
}

/// One user's single, irrevocable wager on one option within a pool.
///
/// At most one bet exists per (pool, user); the store enforces this
/// with a unique index as the last line of defense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    /// Bet identifier.
    pub id: BetId,
    /// Pool the bet was placed on.
    pub pool_id: PoolId,
    /// Betting user.
    pub user_id: UserId,
    /// Chosen option.
    pub option_id: OptionId,
    /// Wagered amount, always positive.
    pub points_wagered: i64,
    /// Placement timestamp.
    pub created_at: DateTime<Utc>,
}

/// A pool together with its options and aggregate stats, as served to
/// clients and carried in `pool_created` / `pool_resolved` events.
#[derive(Debug, Clone, Serialize)]
pub struct PoolView {
    /// The pool row.
    #[serde(flatten)]
    pub pool: Pool,
    /// All options, in creation order.
    pub options: Vec<PoolOption>,
    /// Sum of all wagers on the pool.
    pub total_pot: i64,
    /// Number of bets placed.
    pub bet_count: i64,
    /// Bets, populated only on the single-pool read path.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bets: Vec<Bet>,
}
