//! Append-only points ledger records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EntryId, GroupId, UserId};

/// Category of a points log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum PointsLogType {
    /// Starting balance granted on group creation or join.
    Initial,
    /// Manual grant (or deduction) by a group admin.
    AdminGrant,
    /// Wager debit; amount is negative.
    BetPlaced,
    /// Winnings credit on pool resolution.
    BetWon,
    /// Wager returned on cancellation or a no-winner resolution.
    BetRefund,
    /// Zero-amount marker recording a pool resolution; its reference id
    /// is the winning option. Audit-only — the winning option is also
    /// stored on the pool row.
    PoolResolved,
}

/// Immutable audit record of one balance change.
///
/// The log is the system of record: a member's `points_balance` must
/// always equal the signed sum of their entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsLogEntry {
    /// Entry identifier.
    pub id: EntryId,
    /// Owning group.
    pub group_id: GroupId,
    /// Affected user (for the resolution marker, the resolving actor).
    pub user_id: UserId,
    /// Signed amount; zero only for `pool_resolved` markers.
    pub amount: i64,
    /// Entry category.
    pub entry_type: PointsLogType,
    /// Referenced entity: the bet id for wager/credit entries, the
    /// winning option id for resolution markers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<Uuid>,
    /// Free-text note.
    pub note: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
