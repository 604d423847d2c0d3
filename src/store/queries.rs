//! Query accessors over a `SqliteConnection`.
//!
//! Every function takes `&mut SqliteConnection` so callers decide the
//! transaction boundary: services pass `&mut *tx` for ledger operations
//! and a pooled connection for reads. Rows are decoded as tuples and
//! mapped into domain structs here; nothing outside this module writes
//! SQL.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::domain::{
    Bet, BetId, EntryId, Group, GroupId, GroupMember, MemberRole, OptionId, PointsLogEntry,
    PointsLogType, Pool, PoolId, PoolOption, PoolStatus, UserId,
};
use crate::error::ServiceError;

type GroupRow = (GroupId, String, String, i64, UserId, DateTime<Utc>);
type MemberRow = (GroupId, UserId, MemberRole, i64, DateTime<Utc>);
type PoolRow = (
    PoolId,
    GroupId,
    String,
    String,
    PoolStatus,
    UserId,
    Option<OptionId>,
    Option<DateTime<Utc>>,
    DateTime<Utc>,
);
type BetRow = (BetId, PoolId, UserId, OptionId, i64, DateTime<Utc>);
type EntryRow = (
    EntryId,
    GroupId,
    UserId,
    i64,
    PointsLogType,
    Option<Uuid>,
    String,
    DateTime<Utc>,
);

fn group_from_row(row: GroupRow) -> Group {
    let (id, name, invite_code, default_points, created_by, created_at) = row;
    Group {
        id,
        name,
        invite_code,
        default_points,
        created_by,
        created_at,
    }
}

fn member_from_row(row: MemberRow) -> GroupMember {
    let (group_id, user_id, role, points_balance, joined_at) = row;
    GroupMember {
        group_id,
        user_id,
        role,
        points_balance,
        joined_at,
    }
}

fn pool_from_row(row: PoolRow) -> Pool {
    let (id, group_id, title, description, status, created_by, winning_option_id, resolved_at, created_at) =
        row;
    Pool {
        id,
        group_id,
        title,
        description,
        status,
        created_by,
        winning_option_id,
        resolved_at,
        created_at,
    }
}

fn bet_from_row(row: BetRow) -> Bet {
    let (id, pool_id, user_id, option_id, points_wagered, created_at) = row;
    Bet {
        id,
        pool_id,
        user_id,
        option_id,
        points_wagered,
        created_at,
    }
}

fn entry_from_row(row: EntryRow) -> PointsLogEntry {
    let (id, group_id, user_id, amount, entry_type, reference_id, note, created_at) = row;
    PointsLogEntry {
        id,
        group_id,
        user_id,
        amount,
        entry_type,
        reference_id,
        note,
        created_at,
    }
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

/// Inserts a group row.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure (including an
/// invite-code collision, which callers treat as fatal — the code space
/// is 32^8).
pub async fn insert_group(conn: &mut SqliteConnection, group: &Group) -> Result<(), ServiceError> {
    sqlx::query(
        "INSERT INTO groups (id, name, invite_code, default_points, created_by, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(group.id)
    .bind(&group.name)
    .bind(&group.invite_code)
    .bind(group.default_points)
    .bind(group.created_by)
    .bind(group.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Fetches a group by id.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn group_by_id(
    conn: &mut SqliteConnection,
    id: GroupId,
) -> Result<Option<Group>, ServiceError> {
    let row = sqlx::query_as::<_, GroupRow>(
        "SELECT id, name, invite_code, default_points, created_by, created_at \
         FROM groups WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(group_from_row))
}

/// Fetches a group by its invite code.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn group_by_invite_code(
    conn: &mut SqliteConnection,
    invite_code: &str,
) -> Result<Option<Group>, ServiceError> {
    let row = sqlx::query_as::<_, GroupRow>(
        "SELECT id, name, invite_code, default_points, created_by, created_at \
         FROM groups WHERE invite_code = ?1",
    )
    .bind(invite_code)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(group_from_row))
}

/// Replaces a group's invite code. Returns affected row count.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn update_invite_code(
    conn: &mut SqliteConnection,
    id: GroupId,
    invite_code: &str,
) -> Result<u64, ServiceError> {
    let result = sqlx::query("UPDATE groups SET invite_code = ?1 WHERE id = ?2")
        .bind(invite_code)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Deletes a group and everything it owns, children before parents:
/// bets → options → pools → log entries → members → group.
///
/// Must run inside a transaction so the cascade is all-or-nothing.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn delete_group_cascade(
    conn: &mut SqliteConnection,
    id: GroupId,
) -> Result<(), ServiceError> {
    sqlx::query("DELETE FROM bets WHERE pool_id IN (SELECT id FROM pools WHERE group_id = ?1)")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        "DELETE FROM pool_options WHERE pool_id IN (SELECT id FROM pools WHERE group_id = ?1)",
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;
    sqlx::query("DELETE FROM pools WHERE group_id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM points_log WHERE group_id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM group_members WHERE group_id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM groups WHERE id = ?1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Lists the groups a user belongs to, oldest membership first.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn groups_by_user(
    conn: &mut SqliteConnection,
    user_id: UserId,
) -> Result<Vec<Group>, ServiceError> {
    let rows = sqlx::query_as::<_, GroupRow>(
        "SELECT g.id, g.name, g.invite_code, g.default_points, g.created_by, g.created_at \
         FROM groups g JOIN group_members m ON m.group_id = g.id \
         WHERE m.user_id = ?1 ORDER BY m.joined_at ASC, m.rowid ASC",
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(group_from_row).collect())
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

/// Inserts a membership row.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn insert_member(
    conn: &mut SqliteConnection,
    member: &GroupMember,
) -> Result<(), ServiceError> {
    sqlx::query(
        "INSERT INTO group_members (group_id, user_id, role, points_balance, joined_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(member.group_id)
    .bind(member.user_id)
    .bind(member.role)
    .bind(member.points_balance)
    .bind(member.joined_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Inserts a membership row unless one already exists for the
/// (group, user) pair. Returns whether a row was inserted; `false`
/// means the user was already a member, which lets two racing joins
/// both land on the idempotent path instead of one surfacing a
/// constraint violation.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn insert_member_if_absent(
    conn: &mut SqliteConnection,
    member: &GroupMember,
) -> Result<bool, ServiceError> {
    let result = sqlx::query(
        "INSERT INTO group_members (group_id, user_id, role, points_balance, joined_at) \
         VALUES (?1, ?2, ?3, ?4, ?5) \
         ON CONFLICT (group_id, user_id) DO NOTHING",
    )
    .bind(member.group_id)
    .bind(member.user_id)
    .bind(member.role)
    .bind(member.points_balance)
    .bind(member.joined_at)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Fetches one membership row.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn member(
    conn: &mut SqliteConnection,
    group_id: GroupId,
    user_id: UserId,
) -> Result<Option<GroupMember>, ServiceError> {
    let row = sqlx::query_as::<_, MemberRow>(
        "SELECT group_id, user_id, role, points_balance, joined_at \
         FROM group_members WHERE group_id = ?1 AND user_id = ?2",
    )
    .bind(group_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(member_from_row))
}

/// Atomically adds `delta` (which may be negative) to a member's
/// balance. Returns the affected row count; zero means the member row
/// does not exist.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn adjust_balance(
    conn: &mut SqliteConnection,
    group_id: GroupId,
    user_id: UserId,
    delta: i64,
) -> Result<u64, ServiceError> {
    let result = sqlx::query(
        "UPDATE group_members SET points_balance = points_balance + ?1 \
         WHERE group_id = ?2 AND user_id = ?3",
    )
    .bind(delta)
    .bind(group_id)
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Lists a group's members by balance, highest first (the leaderboard
/// order), with join time as the tiebreak.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn members_by_balance(
    conn: &mut SqliteConnection,
    group_id: GroupId,
) -> Result<Vec<GroupMember>, ServiceError> {
    let rows = sqlx::query_as::<_, MemberRow>(
        "SELECT group_id, user_id, role, points_balance, joined_at \
         FROM group_members WHERE group_id = ?1 \
         ORDER BY points_balance DESC, joined_at ASC",
    )
    .bind(group_id)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(member_from_row).collect())
}

/// Deletes a membership row. Returns the affected row count.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn delete_member(
    conn: &mut SqliteConnection,
    group_id: GroupId,
    user_id: UserId,
) -> Result<u64, ServiceError> {
    let result = sqlx::query("DELETE FROM group_members WHERE group_id = ?1 AND user_id = ?2")
        .bind(group_id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

// ---------------------------------------------------------------------------
// Pools & options
// ---------------------------------------------------------------------------

/// Inserts a pool row.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn insert_pool(conn: &mut SqliteConnection, pool: &Pool) -> Result<(), ServiceError> {
    sqlx::query(
        "INSERT INTO pools \
         (id, group_id, title, description, status, created_by, winning_option_id, resolved_at, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )
    .bind(pool.id)
    .bind(pool.group_id)
    .bind(&pool.title)
    .bind(&pool.description)
    .bind(pool.status)
    .bind(pool.created_by)
    .bind(pool.winning_option_id)
    .bind(pool.resolved_at)
    .bind(pool.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Fetches a pool by id.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn pool_by_id(
    conn: &mut SqliteConnection,
    id: PoolId,
) -> Result<Option<Pool>, ServiceError> {
    let row = sqlx::query_as::<_, PoolRow>(
        "SELECT id, group_id, title, description, status, created_by, \
                winning_option_id, resolved_at, created_at \
         FROM pools WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(pool_from_row))
}

/// Lists a group's pools, newest first, optionally filtered by status.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn pools_by_group(
    conn: &mut SqliteConnection,
    group_id: GroupId,
    status: Option<PoolStatus>,
) -> Result<Vec<Pool>, ServiceError> {
    let rows = if let Some(status) = status {
        sqlx::query_as::<_, PoolRow>(
            "SELECT id, group_id, title, description, status, created_by, \
                    winning_option_id, resolved_at, created_at \
             FROM pools WHERE group_id = ?1 AND status = ?2 ORDER BY created_at DESC",
        )
        .bind(group_id)
        .bind(status)
        .fetch_all(conn)
        .await?
    } else {
        sqlx::query_as::<_, PoolRow>(
            "SELECT id, group_id, title, description, status, created_by, \
                    winning_option_id, resolved_at, created_at \
             FROM pools WHERE group_id = ?1 ORDER BY created_at DESC",
        )
        .bind(group_id)
        .fetch_all(conn)
        .await?
    };
    Ok(rows.into_iter().map(pool_from_row).collect())
}

/// Transitions a pool to `locked`, guarded so it only applies while the
/// pool is still `open`. Returns the affected row count; zero means the
/// pool has moved on (or is missing) and the caller must not treat the
/// lock as applied.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn mark_pool_locked(conn: &mut SqliteConnection, id: PoolId) -> Result<u64, ServiceError> {
    let result = sqlx::query("UPDATE pools SET status = ?1 WHERE id = ?2 AND status = ?3")
        .bind(PoolStatus::Locked)
        .bind(id)
        .bind(PoolStatus::Open)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Marks a pool resolved: status, winning option, and resolution time
/// in one update, guarded so a terminal pool is never overwritten.
/// Returns the affected row count; zero means the pool was no longer
/// settleable.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn mark_pool_resolved(
    conn: &mut SqliteConnection,
    id: PoolId,
    winning_option_id: OptionId,
    resolved_at: DateTime<Utc>,
) -> Result<u64, ServiceError> {
    let result = sqlx::query(
        "UPDATE pools SET status = ?1, winning_option_id = ?2, resolved_at = ?3 \
         WHERE id = ?4 AND status IN (?5, ?6)",
    )
    .bind(PoolStatus::Resolved)
    .bind(winning_option_id)
    .bind(resolved_at)
    .bind(id)
    .bind(PoolStatus::Open)
    .bind(PoolStatus::Locked)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Transitions a pool to `cancelled`, guarded the same way as
/// [`mark_pool_resolved`]. Returns the affected row count.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn mark_pool_cancelled(
    conn: &mut SqliteConnection,
    id: PoolId,
) -> Result<u64, ServiceError> {
    let result = sqlx::query(
        "UPDATE pools SET status = ?1 WHERE id = ?2 AND status IN (?3, ?4)",
    )
    .bind(PoolStatus::Cancelled)
    .bind(id)
    .bind(PoolStatus::Open)
    .bind(PoolStatus::Locked)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Aggregates a pool's total pot and bet count.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn pool_stats(
    conn: &mut SqliteConnection,
    pool_id: PoolId,
) -> Result<(i64, i64), ServiceError> {
    let row = sqlx::query_as::<_, (i64, i64)>(
        "SELECT COALESCE(SUM(points_wagered), 0), COUNT(*) FROM bets WHERE pool_id = ?1",
    )
    .bind(pool_id)
    .fetch_one(conn)
    .await?;
    Ok(row)
}

/// Inserts a pool option row.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn insert_option(
    conn: &mut SqliteConnection,
    option: &PoolOption,
) -> Result<(), ServiceError> {
    sqlx::query("INSERT INTO pool_options (id, pool_id, label) VALUES (?1, ?2, ?3)")
        .bind(option.id)
        .bind(option.pool_id)
        .bind(&option.label)
        .execute(conn)
        .await?;
    Ok(())
}

/// Fetches an option, constrained to the given pool. `None` also covers
/// options that exist but belong to a different pool.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn option_in_pool(
    conn: &mut SqliteConnection,
    option_id: OptionId,
    pool_id: PoolId,
) -> Result<Option<PoolOption>, ServiceError> {
    let row = sqlx::query_as::<_, (OptionId, PoolId, String)>(
        "SELECT id, pool_id, label FROM pool_options WHERE id = ?1 AND pool_id = ?2",
    )
    .bind(option_id)
    .bind(pool_id)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(|(id, pool_id, label)| PoolOption { id, pool_id, label }))
}

/// Lists a pool's options in insertion order.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn options_by_pool(
    conn: &mut SqliteConnection,
    pool_id: PoolId,
) -> Result<Vec<PoolOption>, ServiceError> {
    let rows = sqlx::query_as::<_, (OptionId, PoolId, String)>(
        "SELECT id, pool_id, label FROM pool_options WHERE pool_id = ?1 ORDER BY rowid",
    )
    .bind(pool_id)
    .fetch_all(conn)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(id, pool_id, label)| PoolOption { id, pool_id, label })
        .collect())
}

// ---------------------------------------------------------------------------
// Bets
// ---------------------------------------------------------------------------

/// Inserts a bet row. The `UNIQUE (pool_id, user_id)` index is the last
/// line of defense against concurrent duplicate bets; a violation maps
/// to [`ServiceError::DuplicateBet`].
///
/// # Errors
///
/// Returns [`ServiceError::DuplicateBet`] when the user already has a
/// bet on the pool, [`ServiceError::Storage`] otherwise.
pub async fn insert_bet(conn: &mut SqliteConnection, bet: &Bet) -> Result<(), ServiceError> {
    sqlx::query(
        "INSERT INTO bets (id, pool_id, user_id, option_id, points_wagered, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(bet.id)
    .bind(bet.pool_id)
    .bind(bet.user_id)
    .bind(bet.option_id)
    .bind(bet.points_wagered)
    .bind(bet.created_at)
    .execute(conn)
    .await
    .map_err(|err| {
        if err
            .as_database_error()
            .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
        {
            ServiceError::DuplicateBet
        } else {
            ServiceError::from(err)
        }
    })?;
    Ok(())
}

/// Whether the user already has a bet on the pool.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn bet_exists(
    conn: &mut SqliteConnection,
    pool_id: PoolId,
    user_id: UserId,
) -> Result<bool, ServiceError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM bets WHERE pool_id = ?1 AND user_id = ?2",
    )
    .bind(pool_id)
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}

/// Lists a pool's bets in creation order. Settlement iterates this
/// order, so the remainder holder is deterministic.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn bets_by_pool(
    conn: &mut SqliteConnection,
    pool_id: PoolId,
) -> Result<Vec<Bet>, ServiceError> {
    let rows = sqlx::query_as::<_, BetRow>(
        "SELECT id, pool_id, user_id, option_id, points_wagered, created_at \
         FROM bets WHERE pool_id = ?1 ORDER BY created_at ASC, rowid ASC",
    )
    .bind(pool_id)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(bet_from_row).collect())
}

// ---------------------------------------------------------------------------
// Points log
// ---------------------------------------------------------------------------

/// Appends a points log entry. The log is append-only; there is no
/// update or single-row delete path.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn append_log_entry(
    conn: &mut SqliteConnection,
    entry: &PointsLogEntry,
) -> Result<(), ServiceError> {
    sqlx::query(
        "INSERT INTO points_log \
         (id, group_id, user_id, amount, entry_type, reference_id, note, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(entry.id)
    .bind(entry.group_id)
    .bind(entry.user_id)
    .bind(entry.amount)
    .bind(entry.entry_type)
    .bind(entry.reference_id)
    .bind(&entry.note)
    .bind(entry.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Lists a group's log entries, oldest first.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn log_entries_by_group(
    conn: &mut SqliteConnection,
    group_id: GroupId,
) -> Result<Vec<PointsLogEntry>, ServiceError> {
    let rows = sqlx::query_as::<_, EntryRow>(
        "SELECT id, group_id, user_id, amount, entry_type, reference_id, note, created_at \
         FROM points_log WHERE group_id = ?1 ORDER BY created_at ASC, rowid ASC",
    )
    .bind(group_id)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(entry_from_row).collect())
}

/// Lists one page of a group's log entries, newest first, optionally
/// filtered to a single member.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn log_entries_page(
    conn: &mut SqliteConnection,
    group_id: GroupId,
    user_id: Option<UserId>,
    limit: i64,
    offset: i64,
) -> Result<Vec<PointsLogEntry>, ServiceError> {
    let rows = if let Some(user_id) = user_id {
        sqlx::query_as::<_, EntryRow>(
            "SELECT id, group_id, user_id, amount, entry_type, reference_id, note, created_at \
             FROM points_log WHERE group_id = ?1 AND user_id = ?2 \
             ORDER BY created_at DESC, rowid DESC LIMIT ?3 OFFSET ?4",
        )
        .bind(group_id)
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(conn)
        .await?
    } else {
        sqlx::query_as::<_, EntryRow>(
            "SELECT id, group_id, user_id, amount, entry_type, reference_id, note, created_at \
             FROM points_log WHERE group_id = ?1 \
             ORDER BY created_at DESC, rowid DESC LIMIT ?2 OFFSET ?3",
        )
        .bind(group_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(conn)
        .await?
    };
    Ok(rows.into_iter().map(entry_from_row).collect())
}

/// Counts a group's log entries, optionally for a single member.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] on database failure.
pub async fn count_log_entries(
    conn: &mut SqliteConnection,
    group_id: GroupId,
    user_id: Option<UserId>,
) -> Result<i64, ServiceError> {
    let count: i64 = if let Some(user_id) = user_id {
        sqlx::query_scalar("SELECT COUNT(*) FROM points_log WHERE group_id = ?1 AND user_id = ?2")
            .bind(group_id)
            .bind(user_id)
            .fetch_one(conn)
            .await?
    } else {
        sqlx::query_scalar("SELECT COUNT(*) FROM points_log WHERE group_id = ?1")
            .bind(group_id)
            .fetch_one(conn)
            .await?
    };
    Ok(count)
}
