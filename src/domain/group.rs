//! Groups, membership, and invite codes.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{GroupId, UserId};

/// Invite code alphabet with ambiguous characters removed (0/O, 1/I).
const INVITE_CODE_ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of a group invite code.
pub const INVITE_CODE_LEN: usize = 8;

/// A closed group of users sharing a points currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Group identifier.
    pub id: GroupId,
    /// Display name.
    pub name: String,
    /// Shareable join code, unique across all groups.
    pub invite_code: String,
    /// Starting balance granted to every new member.
    pub default_points: i64,
    /// User who created the group (also its first admin).
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Role of a member within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MemberRole {
    /// Can manage the group, grant points, and settle any pool.
    Admin,
    /// Regular member: can create pools and place bets.
    Member,
}

impl MemberRole {
    /// Whether this role carries group administration rights.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// One user's membership in one group. Unique by (group, user).
///
/// `points_balance` is a cached projection of the member's points log:
/// it must always equal the signed sum of their
/// [`super::PointsLogEntry`] amounts. It is never enforced non-negative
/// at rest; spending is checked at spend time inside the same
/// transaction as the debit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
    /// Owning group.
    pub group_id: GroupId,
    /// Member user id.
    pub user_id: UserId,
    /// Member role.
    pub role: MemberRole,
    /// Spendable points balance.
    pub points_balance: i64,
    /// When the user joined the group.
    pub joined_at: DateTime<Utc>,
}

/// Generates a fresh 8-character invite code from the unambiguous
/// alphabet (no 0/O or 1/I).
#[must_use]
pub fn generate_invite_code() -> String {
    let mut rng = rand::thread_rng();
    let bytes = INVITE_CODE_ALPHABET.as_bytes();
    (0..INVITE_CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..bytes.len());
            bytes.get(idx).copied().unwrap_or(b'A') as char
        })
        .collect()
}
