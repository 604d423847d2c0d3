//! Group service: membership, points grants, and group lifecycle.
//!
//! Mirrors the ledger discipline of [`super::PoolService`]: every
//! balance change is paired with its points-log entry inside one
//! transaction.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::{
    EntryId, Group, GroupId, GroupMember, MemberRole, PointsLogEntry, PointsLogType, UserId,
    generate_invite_code,
};
use crate::error::ServiceError;
use crate::store::{Store, queries};

/// Request payload for creating a group.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGroupRequest {
    /// Group display name.
    pub name: String,
    /// Starting balance for every member, defaults to 1000.
    #[serde(default = "default_points")]
    pub default_points: i64,
}

fn default_points() -> i64 {
    1000
}

/// Request payload for joining a group by invite code.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinGroupRequest {
    /// The group's invite code.
    pub invite_code: String,
}

/// Request payload for an admin points grant.
#[derive(Debug, Clone, Deserialize)]
pub struct GrantPointsRequest {
    /// Target member.
    pub user_id: UserId,
    /// Signed amount to grant (negative deducts).
    pub amount: i64,
    /// Reason recorded in the points log.
    #[serde(default)]
    pub note: String,
}

/// One page of a group's points history, newest entries first.
#[derive(Debug, Serialize)]
pub struct PointsHistoryPage {
    /// Entries on this page.
    pub entries: Vec<PointsLogEntry>,
    /// Total matching entries across all pages.
    pub total: i64,
    /// Page size actually applied.
    pub limit: i64,
    /// Offset actually applied.
    pub offset: i64,
}

/// Orchestrates group and membership operations against the store.
#[derive(Debug, Clone)]
pub struct GroupService {
    store: Store,
}

impl GroupService {
    /// Creates a new `GroupService`.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Creates a group with a fresh invite code and the creator as its
    /// first admin, seeded with the default balance and an `initial`
    /// log entry, in one transaction.
    ///
    /// # Errors
    ///
    /// [`ServiceError::InvalidRequest`] for a blank name or negative
    /// default balance; [`ServiceError::Storage`] on database failure.
    pub async fn create_group(
        &self,
        creator: UserId,
        req: CreateGroupRequest,
    ) -> Result<Group, ServiceError> {
        if req.name.trim().is_empty() {
            return Err(ServiceError::InvalidRequest("name must not be empty".into()));
        }
        if req.default_points < 0 {
            return Err(ServiceError::InvalidRequest(
                "default points must not be negative".into(),
            ));
        }

        let group = Group {
            id: GroupId::new(),
            name: req.name,
            invite_code: generate_invite_code(),
            default_points: req.default_points,
            created_by: creator,
            created_at: Utc::now(),
        };

        let mut tx = self.store.begin().await?;
        queries::insert_group(&mut tx, &group).await?;
        queries::insert_member(
            &mut tx,
            &GroupMember {
                group_id: group.id,
                user_id: creator,
                role: MemberRole::Admin,
                points_balance: group.default_points,
                joined_at: Utc::now(),
            },
        )
        .await?;
        queries::append_log_entry(
            &mut tx,
            &PointsLogEntry {
                id: EntryId::new(),
                group_id: group.id,
                user_id: creator,
                amount: group.default_points,
                entry_type: PointsLogType::Initial,
                reference_id: None,
                note: "Initial points on group creation".into(),
                created_at: Utc::now(),
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!(group_id = %group.id, %creator, "group created");
        Ok(group)
    }

    /// Joins a group by invite code. Already being a member is not an
    /// error; the group is returned and `joined` is `false`. The
    /// membership insert is conflict-tolerant, so two racing joins by
    /// the same user both land on the idempotent path.
    ///
    /// # Errors
    ///
    /// [`ServiceError::InvalidInviteCode`] for an unknown code;
    /// [`ServiceError::Storage`] on database failure.
    pub async fn join_group(
        &self,
        user_id: UserId,
        req: JoinGroupRequest,
    ) -> Result<(Group, bool), ServiceError> {
        let mut tx = self.store.begin().await?;
        let group = queries::group_by_invite_code(&mut tx, &req.invite_code)
            .await?
            .ok_or(ServiceError::InvalidInviteCode)?;
        let inserted = queries::insert_member_if_absent(
            &mut tx,
            &GroupMember {
                group_id: group.id,
                user_id,
                role: MemberRole::Member,
                points_balance: group.default_points,
                joined_at: Utc::now(),
            },
        )
        .await?;
        if !inserted {
            // Nothing written; dropping the transaction is a no-op.
            return Ok((group, false));
        }
        queries::append_log_entry(
            &mut tx,
            &PointsLogEntry {
                id: EntryId::new(),
                group_id: group.id,
                user_id,
                amount: group.default_points,
                entry_type: PointsLogType::Initial,
                reference_id: None,
                note: "Initial points on joining group".into(),
                created_at: Utc::now(),
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!(group_id = %group.id, %user_id, "member joined");
        Ok((group, true))
    }

    /// Grants (or deducts) points: atomic balance increment plus the
    /// `admin_grant` log entry.
    ///
    /// # Errors
    ///
    /// [`ServiceError::InvalidRequest`] for a zero amount,
    /// [`ServiceError::MemberNotFound`] if the target is not a member,
    /// or [`ServiceError::Storage`].
    pub async fn grant_points(
        &self,
        group_id: GroupId,
        req: GrantPointsRequest,
    ) -> Result<(), ServiceError> {
        if req.amount == 0 {
            return Err(ServiceError::InvalidRequest("amount must not be zero".into()));
        }

        let mut tx = self.store.begin().await?;
        let affected = queries::adjust_balance(&mut tx, group_id, req.user_id, req.amount).await?;
        if affected == 0 {
            return Err(ServiceError::MemberNotFound {
                group_id,
                user_id: req.user_id,
            });
        }
        queries::append_log_entry(
            &mut tx,
            &PointsLogEntry {
                id: EntryId::new(),
                group_id,
                user_id: req.user_id,
                amount: req.amount,
                entry_type: PointsLogType::AdminGrant,
                reference_id: None,
                note: req.note,
                created_at: Utc::now(),
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!(%group_id, user_id = %req.user_id, amount = req.amount, "points granted");
        Ok(())
    }

    /// Removes a member from the group.
    ///
    /// # Errors
    ///
    /// [`ServiceError::MemberNotFound`] if no such membership exists,
    /// or [`ServiceError::Storage`].
    pub async fn kick_member(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<(), ServiceError> {
        let mut conn = self.store.acquire().await?;
        let affected = queries::delete_member(&mut conn, group_id, user_id).await?;
        if affected == 0 {
            return Err(ServiceError::MemberNotFound { group_id, user_id });
        }
        tracing::info!(%group_id, %user_id, "member kicked");
        Ok(())
    }

    /// Deletes a group and everything it owns in one ordered
    /// transaction (bets → options → pools → log entries → members →
    /// group).
    ///
    /// # Errors
    ///
    /// [`ServiceError::GroupNotFound`] if the group does not exist, or
    /// [`ServiceError::Storage`].
    pub async fn delete_group(&self, group_id: GroupId) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;
        if queries::group_by_id(&mut tx, group_id).await?.is_none() {
            return Err(ServiceError::GroupNotFound(group_id));
        }
        queries::delete_group_cascade(&mut tx, group_id).await?;
        tx.commit().await?;

        tracing::info!(%group_id, "group deleted");
        Ok(())
    }

    /// Replaces the group's invite code and returns the new one.
    ///
    /// # Errors
    ///
    /// [`ServiceError::GroupNotFound`] or [`ServiceError::Storage`].
    pub async fn regenerate_invite_code(&self, group_id: GroupId) -> Result<String, ServiceError> {
        let code = generate_invite_code();
        let mut conn = self.store.acquire().await?;
        let affected = queries::update_invite_code(&mut conn, group_id, &code).await?;
        if affected == 0 {
            return Err(ServiceError::GroupNotFound(group_id));
        }
        Ok(code)
    }

    /// Fetches a group with its members in leaderboard order.
    ///
    /// # Errors
    ///
    /// [`ServiceError::GroupNotFound`] or [`ServiceError::Storage`].
    pub async fn get_group(
        &self,
        group_id: GroupId,
    ) -> Result<(Group, Vec<GroupMember>), ServiceError> {
        let mut conn = self.store.acquire().await?;
        let group = queries::group_by_id(&mut conn, group_id)
            .await?
            .ok_or(ServiceError::GroupNotFound(group_id))?;
        let members = queries::members_by_balance(&mut conn, group_id).await?;
        Ok((group, members))
    }

    /// Lists a group's members ordered by balance, highest first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] on database failure.
    pub async fn leaderboard(&self, group_id: GroupId) -> Result<Vec<GroupMember>, ServiceError> {
        let mut conn = self.store.acquire().await?;
        queries::members_by_balance(&mut conn, group_id).await
    }

    /// Lists the groups the user belongs to, oldest membership first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] on database failure.
    pub async fn groups_for_user(&self, user_id: UserId) -> Result<Vec<Group>, ServiceError> {
        let mut conn = self.store.acquire().await?;
        queries::groups_by_user(&mut conn, user_id).await
    }

    /// Reads one page of the group's points history, newest first,
    /// optionally filtered to a single member. `limit` is clamped to
    /// 1..=100.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] on database failure.
    pub async fn points_history(
        &self,
        group_id: GroupId,
        user_id: Option<UserId>,
        limit: i64,
        offset: i64,
    ) -> Result<PointsHistoryPage, ServiceError> {
        let limit = limit.clamp(1, 100);
        let offset = offset.max(0);
        let mut conn = self.store.acquire().await?;
        let total = queries::count_log_entries(&mut conn, group_id, user_id).await?;
        let entries = queries::log_entries_page(&mut conn, group_id, user_id, limit, offset).await?;
        Ok(PointsHistoryPage {
            entries,
            total,
            limit,
            offset,
        })
    }

    /// Fetches one membership row, used by handlers to resolve the
    /// acting user's admin flag.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] on database failure.
    pub async fn member(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<Option<GroupMember>, ServiceError> {
        let mut conn = self.store.acquire().await?;
        queries::member(&mut conn, group_id, user_id).await
    }
}
