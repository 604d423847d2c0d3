//! Pool service: the wagering ledger and pool-resolution state machine.
//!
//! Every mutation follows the pattern: begin transaction → check → write
//! rows (balance change + bet + log entry together) → commit. An error
//! anywhere drops the transaction, rolling back every partial write, so
//! no bet or balance change can persist without its log entry and vice
//! versa.

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{
    Bet, BetId, EntryId, GroupId, OptionId, PointsLogEntry, PointsLogType, Pool, PoolId,
    PoolOption, PoolStatus, PoolView, UserId, settle,
};
use crate::error::ServiceError;
use crate::store::{Store, queries};

/// Request payload for creating a pool.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePoolRequest {
    /// Pool title (the question being predicted).
    pub title: String,
    /// Optional free-text description.
    #[serde(default)]
    pub description: String,
    /// Option labels, at least two.
    pub options: Vec<String>,
}

/// Request payload for placing a bet.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceBetRequest {
    /// Chosen option.
    pub option_id: OptionId,
    /// Points to wager, must be positive.
    pub points: i64,
}

/// Orchestrates pool lifecycle and bet placement against the store.
#[derive(Debug, Clone)]
pub struct PoolService {
    store: Store,
}

impl PoolService {
    /// Creates a new `PoolService`.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Creates a pool in `open` status with one option row per label,
    /// in one transaction.
    ///
    /// # Errors
    ///
    /// [`ServiceError::InvalidRequest`] with fewer than two options or a
    /// blank title/label; [`ServiceError::Storage`] on database failure.
    pub async fn create_pool(
        &self,
        group_id: GroupId,
        creator: UserId,
        req: CreatePoolRequest,
    ) -> Result<PoolView, ServiceError> {
        if req.title.trim().is_empty() {
            return Err(ServiceError::InvalidRequest("title must not be empty".into()));
        }
        if req.options.len() < 2 {
            return Err(ServiceError::InvalidRequest(
                "a pool needs at least 2 options".into(),
            ));
        }
        if req.options.iter().any(|label| label.trim().is_empty()) {
            return Err(ServiceError::InvalidRequest(
                "option labels must not be empty".into(),
            ));
        }

        let pool = Pool {
            id: PoolId::new(),
            group_id,
            title: req.title,
            description: req.description,
            status: PoolStatus::Open,
            created_by: creator,
            winning_option_id: None,
            resolved_at: None,
            created_at: Utc::now(),
        };
        let options: Vec<PoolOption> = req
            .options
            .into_iter()
            .map(|label| PoolOption {
                id: OptionId::new(),
                pool_id: pool.id,
                label,
            })
            .collect();

        let mut tx = self.store.begin().await?;
        queries::insert_pool(&mut tx, &pool).await?;
        for option in &options {
            queries::insert_option(&mut tx, option).await?;
        }
        tx.commit().await?;

        tracing::info!(pool_id = %pool.id, %group_id, "pool created");
        Ok(PoolView {
            pool,
            options,
            total_pot: 0,
            bet_count: 0,
            bets: Vec::new(),
        })
    }

    /// Places a bet: debits the member's balance, inserts the bet, and
    /// appends the `bet_placed` log entry atomically.
    ///
    /// # Errors
    ///
    /// [`ServiceError::PoolNotFound`], [`ServiceError::InvalidState`]
    /// unless the pool is open, [`ServiceError::OptionNotInPool`],
    /// [`ServiceError::DuplicateBet`], [`ServiceError::NotAMember`],
    /// [`ServiceError::InsufficientPoints`], or
    /// [`ServiceError::Storage`].
    pub async fn place_bet(
        &self,
        pool_id: PoolId,
        user_id: UserId,
        req: PlaceBetRequest,
    ) -> Result<Bet, ServiceError> {
        if req.points <= 0 {
            return Err(ServiceError::InvalidRequest("wager must be positive".into()));
        }

        let mut tx = self.store.begin().await?;

        let pool = queries::pool_by_id(&mut tx, pool_id)
            .await?
            .ok_or(ServiceError::PoolNotFound(pool_id))?;
        if !pool.status.accepts_bets() {
            return Err(ServiceError::InvalidState {
                status: pool.status,
            });
        }

        let option = queries::option_in_pool(&mut tx, req.option_id, pool_id)
            .await?
            .ok_or(ServiceError::OptionNotInPool(req.option_id))?;

        if queries::bet_exists(&mut tx, pool_id, user_id).await? {
            return Err(ServiceError::DuplicateBet);
        }

        let member = queries::member(&mut tx, pool.group_id, user_id)
            .await?
            .ok_or(ServiceError::NotAMember)?;
        if member.points_balance < req.points {
            return Err(ServiceError::InsufficientPoints {
                have: member.points_balance,
                need: req.points,
            });
        }

        queries::adjust_balance(&mut tx, pool.group_id, user_id, -req.points).await?;

        let bet = Bet {
            id: BetId::new(),
            pool_id,
            user_id,
            option_id: req.option_id,
            points_wagered: req.points,
            created_at: Utc::now(),
        };
        queries::insert_bet(&mut tx, &bet).await?;

        queries::append_log_entry(
            &mut tx,
            &PointsLogEntry {
                id: EntryId::new(),
                group_id: pool.group_id,
                user_id,
                amount: -req.points,
                entry_type: PointsLogType::BetPlaced,
                reference_id: Some(*bet.id.as_uuid()),
                note: format!("Bet on \"{}\" in pool \"{}\"", option.label, pool.title),
                created_at: Utc::now(),
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(%pool_id, %user_id, points = req.points, "bet placed");
        Ok(bet)
    }

    /// Transitions an open pool to `locked`. Locking blocks further
    /// bets but not resolution.
    ///
    /// # Errors
    ///
    /// [`ServiceError::PoolNotFound`], [`ServiceError::InvalidState`]
    /// unless open, [`ServiceError::PermissionDenied`] unless the actor
    /// is the pool creator or a group admin, or
    /// [`ServiceError::Storage`].
    pub async fn lock_pool(
        &self,
        pool_id: PoolId,
        actor: UserId,
        is_admin: bool,
    ) -> Result<Pool, ServiceError> {
        let mut tx = self.store.begin().await?;

        let mut pool = queries::pool_by_id(&mut tx, pool_id)
            .await?
            .ok_or(ServiceError::PoolNotFound(pool_id))?;
        if pool.status != PoolStatus::Open {
            return Err(ServiceError::InvalidState {
                status: pool.status,
            });
        }
        ensure_can_manage(&pool, actor, is_admin)?;

        // The update is guarded on `open`, so a lock racing a resolve
        // can never drag a terminal pool back to locked.
        if queries::mark_pool_locked(&mut tx, pool_id).await? == 0 {
            let current = queries::pool_by_id(&mut tx, pool_id)
                .await?
                .ok_or(ServiceError::PoolNotFound(pool_id))?;
            return Err(ServiceError::InvalidState {
                status: current.status,
            });
        }
        tx.commit().await?;
        pool.status = PoolStatus::Locked;

        tracing::info!(%pool_id, %actor, "pool locked");
        Ok(pool)
    }

    /// Resolves a pool: distributes the pot to winning bets (or refunds
    /// everyone when nobody picked the winner), marks the pool resolved
    /// with the winning option, and appends the zero-amount
    /// `pool_resolved` audit marker. Steps run in one transaction.
    ///
    /// The pot split is computed by [`settle`]: each winner gets
    /// `floor(wager × pot / winning_total)` except the last, which gets
    /// the remainder, so credits always sum exactly to the pot.
    ///
    /// # Errors
    ///
    /// [`ServiceError::PoolNotFound`], [`ServiceError::InvalidState`]
    /// from resolved/cancelled, [`ServiceError::PermissionDenied`],
    /// [`ServiceError::OptionNotInPool`], or [`ServiceError::Storage`].
    pub async fn resolve_pool(
        &self,
        pool_id: PoolId,
        winning_option_id: OptionId,
        actor: UserId,
        is_admin: bool,
    ) -> Result<PoolView, ServiceError> {
        let mut tx = self.store.begin().await?;

        let pool = queries::pool_by_id(&mut tx, pool_id)
            .await?
            .ok_or(ServiceError::PoolNotFound(pool_id))?;
        if !pool.status.is_settleable() {
            return Err(ServiceError::InvalidState {
                status: pool.status,
            });
        }
        ensure_can_manage(&pool, actor, is_admin)?;

        let option = queries::option_in_pool(&mut tx, winning_option_id, pool_id)
            .await?
            .ok_or(ServiceError::OptionNotInPool(winning_option_id))?;

        let bets = queries::bets_by_pool(&mut tx, pool_id).await?;
        let settlement = settle(&bets, winning_option_id);

        for line in &settlement.credits {
            let note = match line.entry_type {
                PointsLogType::BetWon => {
                    format!("Won {} points from pool \"{}\"", line.amount, pool.title)
                }
                _ => "No winners, bet refunded".to_string(),
            };
            credit_member(
                &mut tx,
                pool.group_id,
                line.user_id,
                line.amount,
                line.entry_type,
                Some(*line.bet_id.as_uuid()),
                note,
            )
            .await?;
        }

        let resolved_at = Utc::now();
        if queries::mark_pool_resolved(&mut tx, pool_id, winning_option_id, resolved_at).await? == 0
        {
            let current = queries::pool_by_id(&mut tx, pool_id)
                .await?
                .ok_or(ServiceError::PoolNotFound(pool_id))?;
            return Err(ServiceError::InvalidState {
                status: current.status,
            });
        }

        // Audit marker; the winning option is read from the pool row,
        // never reconstructed from this entry.
        queries::append_log_entry(
            &mut tx,
            &PointsLogEntry {
                id: EntryId::new(),
                group_id: pool.group_id,
                user_id: actor,
                amount: 0,
                entry_type: PointsLogType::PoolResolved,
                reference_id: Some(*winning_option_id.as_uuid()),
                note: format!(
                    "Resolved pool \"{}\" - winning option: \"{}\"",
                    pool.title, option.label
                ),
                created_at: resolved_at,
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            %pool_id,
            %winning_option_id,
            total_pot = settlement.total_pot,
            winners = settlement.total_winning_wagers,
            "pool resolved"
        );
        self.get_pool(pool_id).await
    }

    /// Cancels a pool: refunds every bet in full and sets `cancelled`,
    /// atomically.
    ///
    /// # Errors
    ///
    /// [`ServiceError::PoolNotFound`], [`ServiceError::InvalidState`]
    /// if already resolved/cancelled, [`ServiceError::PermissionDenied`],
    /// or [`ServiceError::Storage`].
    pub async fn cancel_pool(
        &self,
        pool_id: PoolId,
        actor: UserId,
        is_admin: bool,
    ) -> Result<Pool, ServiceError> {
        let mut tx = self.store.begin().await?;

        let mut pool = queries::pool_by_id(&mut tx, pool_id)
            .await?
            .ok_or(ServiceError::PoolNotFound(pool_id))?;
        if !pool.status.is_settleable() {
            return Err(ServiceError::InvalidState {
                status: pool.status,
            });
        }
        ensure_can_manage(&pool, actor, is_admin)?;

        let bets = queries::bets_by_pool(&mut tx, pool_id).await?;
        for bet in &bets {
            credit_member(
                &mut tx,
                pool.group_id,
                bet.user_id,
                bet.points_wagered,
                PointsLogType::BetRefund,
                Some(*bet.id.as_uuid()),
                "Pool cancelled, bet refunded".to_string(),
            )
            .await?;
        }

        if queries::mark_pool_cancelled(&mut tx, pool_id).await? == 0 {
            let current = queries::pool_by_id(&mut tx, pool_id)
                .await?
                .ok_or(ServiceError::PoolNotFound(pool_id))?;
            return Err(ServiceError::InvalidState {
                status: current.status,
            });
        }
        tx.commit().await?;

        pool.status = PoolStatus::Cancelled;
        tracing::info!(%pool_id, refunded_bets = bets.len(), "pool cancelled");
        Ok(pool)
    }

    /// Fetches a pool with its options, bets, and aggregate stats.
    ///
    /// # Errors
    ///
    /// [`ServiceError::PoolNotFound`] or [`ServiceError::Storage`].
    pub async fn get_pool(&self, pool_id: PoolId) -> Result<PoolView, ServiceError> {
        let mut conn = self.store.acquire().await?;

        let pool = queries::pool_by_id(&mut conn, pool_id)
            .await?
            .ok_or(ServiceError::PoolNotFound(pool_id))?;
        let options = queries::options_by_pool(&mut conn, pool_id).await?;
        let bets = queries::bets_by_pool(&mut conn, pool_id).await?;
        let (total_pot, bet_count) = queries::pool_stats(&mut conn, pool_id).await?;

        Ok(PoolView {
            pool,
            options,
            total_pot,
            bet_count,
            bets,
        })
    }

    /// Lists a group's pools (newest first, optional status filter) with
    /// options and stats but without individual bets.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] on database failure.
    pub async fn list_pools(
        &self,
        group_id: GroupId,
        status: Option<PoolStatus>,
    ) -> Result<Vec<PoolView>, ServiceError> {
        let mut conn = self.store.acquire().await?;

        let pools = queries::pools_by_group(&mut conn, group_id, status).await?;
        let mut views = Vec::with_capacity(pools.len());
        for pool in pools {
            let options = queries::options_by_pool(&mut conn, pool.id).await?;
            let (total_pot, bet_count) = queries::pool_stats(&mut conn, pool.id).await?;
            views.push(PoolView {
                pool,
                options,
                total_pot,
                bet_count,
                bets: Vec::new(),
            });
        }
        Ok(views)
    }
}

/// Creator-or-admin permission check shared by lock/resolve/cancel.
fn ensure_can_manage(pool: &Pool, actor: UserId, is_admin: bool) -> Result<(), ServiceError> {
    if pool.created_by == actor || is_admin {
        Ok(())
    } else {
        Err(ServiceError::PermissionDenied(
            "only the pool creator or a group admin can manage this pool".into(),
        ))
    }
}

/// Credits a member inside the enclosing transaction: balance increment
/// plus the matching log entry, never one without the other.
async fn credit_member(
    conn: &mut sqlx::SqliteConnection,
    group_id: GroupId,
    user_id: UserId,
    amount: i64,
    entry_type: PointsLogType,
    reference_id: Option<Uuid>,
    note: String,
) -> Result<(), ServiceError> {
    queries::adjust_balance(&mut *conn, group_id, user_id, amount).await?;
    queries::append_log_entry(
        &mut *conn,
        &PointsLogEntry {
            id: EntryId::new(),
            group_id,
            user_id,
            amount,
            entry_type,
            reference_id,
            note,
            created_at: Utc::now(),
        },
    )
    .await
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::{Group, GroupMember, MemberRole, generate_invite_code};

    /// Seeds a group with one member per starting balance. The first
    /// member is the group admin.
    async fn seed_group(store: &Store, balances: &[i64]) -> (GroupId, Vec<UserId>) {
        let users: Vec<UserId> = balances.iter().map(|_| UserId::new()).collect();
        let group = Group {
            id: GroupId::new(),
            name: "Test League".into(),
            invite_code: generate_invite_code(),
            default_points: 1000,
            created_by: users[0],
            created_at: Utc::now(),
        };

        let mut conn = store.acquire().await.unwrap();
        queries::insert_group(&mut conn, &group).await.unwrap();
        for (i, (&user_id, &balance)) in users.iter().zip(balances).enumerate() {
            let role = if i == 0 {
                MemberRole::Admin
            } else {
                MemberRole::Member
            };
            queries::insert_member(
                &mut conn,
                &GroupMember {
                    group_id: group.id,
                    user_id,
                    role,
                    points_balance: balance,
                    joined_at: Utc::now(),
                },
            )
            .await
            .unwrap();
        }
        (group.id, users)
    }

    async fn test_service() -> (Store, PoolService) {
        let store = Store::open_in_memory().await.unwrap();
        store.migrate().await.unwrap();
        let service = PoolService::new(store.clone());
        (store, service)
    }

    fn pool_request(options: &[&str]) -> CreatePoolRequest {
        CreatePoolRequest {
            title: "Who wins the cookoff?".into(),
            description: String::new(),
            options: options.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    async fn balance(store: &Store, group_id: GroupId, user_id: UserId) -> i64 {
        let mut conn = store.acquire().await.unwrap();
        queries::member(&mut conn, group_id, user_id)
            .await
            .unwrap()
            .unwrap()
            .points_balance
    }

    #[tokio::test]
    async fn create_pool_requires_two_options() {
        let (store, service) = test_service().await;
        let (group_id, users) = seed_group(&store, &[1000]).await;

        let err = service
            .create_pool(group_id, users[0], pool_request(&["Only one"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn create_pool_opens_with_options() {
        let (store, service) = test_service().await;
        let (group_id, users) = seed_group(&store, &[1000]).await;

        let view = service
            .create_pool(group_id, users[0], pool_request(&["Winner", "Loser"]))
            .await
            .unwrap();
        assert_eq!(view.pool.status, PoolStatus::Open);
        assert_eq!(view.options.len(), 2);
        assert_eq!(view.total_pot, 0);
        assert!(view.pool.winning_option_id.is_none());
    }

    #[tokio::test]
    async fn place_bet_debits_balance_and_logs() {
        let (store, service) = test_service().await;
        let (group_id, users) = seed_group(&store, &[1000]).await;
        let view = service
            .create_pool(group_id, users[0], pool_request(&["A", "B"]))
            .await
            .unwrap();

        let bet = service
            .place_bet(
                view.pool.id,
                users[0],
                PlaceBetRequest {
                    option_id: view.options[0].id,
                    points: 100,
                },
            )
            .await
            .unwrap();

        assert_eq!(balance(&store, group_id, users[0]).await, 900);

        let mut conn = store.acquire().await.unwrap();
        let entries = queries::log_entries_by_group(&mut conn, group_id)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].amount, -100);
        assert_eq!(entries[0].entry_type, PointsLogType::BetPlaced);
        assert_eq!(entries[0].reference_id, Some(*bet.id.as_uuid()));
    }

    #[tokio::test]
    async fn bet_rejected_unless_pool_open() {
        let (store, service) = test_service().await;
        let (group_id, users) = seed_group(&store, &[1000]).await;
        let view = service
            .create_pool(group_id, users[0], pool_request(&["A", "B"]))
            .await
            .unwrap();
        service
            .lock_pool(view.pool.id, users[0], false)
            .await
            .unwrap();

        let err = service
            .place_bet(
                view.pool.id,
                users[0],
                PlaceBetRequest {
                    option_id: view.options[0].id,
                    points: 10,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidState {
                status: PoolStatus::Locked
            }
        ));
        // Nothing was debited.
        assert_eq!(balance(&store, group_id, users[0]).await, 1000);
    }

    #[tokio::test]
    async fn second_bet_on_same_pool_conflicts() {
        let (store, service) = test_service().await;
        let (group_id, users) = seed_group(&store, &[1000]).await;
        let view = service
            .create_pool(group_id, users[0], pool_request(&["A", "B"]))
            .await
            .unwrap();

        let req = PlaceBetRequest {
            option_id: view.options[0].id,
            points: 50,
        };
        service
            .place_bet(view.pool.id, users[0], req.clone())
            .await
            .unwrap();
        let err = service
            .place_bet(view.pool.id, users[0], req)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateBet));
        assert_eq!(balance(&store, group_id, users[0]).await, 950);
    }

    #[tokio::test]
    async fn insufficient_points_rejected_without_partial_writes() {
        let (store, service) = test_service().await;
        let (group_id, users) = seed_group(&store, &[30]).await;
        let view = service
            .create_pool(group_id, users[0], pool_request(&["A", "B"]))
            .await
            .unwrap();

        let err = service
            .place_bet(
                view.pool.id,
                users[0],
                PlaceBetRequest {
                    option_id: view.options[0].id,
                    points: 100,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InsufficientPoints { have: 30, need: 100 }
        ));

        let mut conn = store.acquire().await.unwrap();
        assert!(
            queries::log_entries_by_group(&mut conn, group_id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn non_member_cannot_bet() {
        let (store, service) = test_service().await;
        let (group_id, users) = seed_group(&store, &[1000]).await;
        let view = service
            .create_pool(group_id, users[0], pool_request(&["A", "B"]))
            .await
            .unwrap();

        let err = service
            .place_bet(
                view.pool.id,
                UserId::new(),
                PlaceBetRequest {
                    option_id: view.options[0].id,
                    points: 10,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotAMember));
    }

    #[tokio::test]
    async fn option_from_another_pool_rejected() {
        let (store, service) = test_service().await;
        let (group_id, users) = seed_group(&store, &[1000]).await;
        let first = service
            .create_pool(group_id, users[0], pool_request(&["A", "B"]))
            .await
            .unwrap();
        let second = service
            .create_pool(group_id, users[0], pool_request(&["X", "Y"]))
            .await
            .unwrap();

        let err = service
            .place_bet(
                first.pool.id,
                users[0],
                PlaceBetRequest {
                    option_id: second.options[0].id,
                    points: 10,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::OptionNotInPool(_)));
    }

    #[tokio::test]
    async fn lock_requires_creator_or_admin() {
        let (store, service) = test_service().await;
        let (group_id, users) = seed_group(&store, &[1000, 1000]).await;
        let view = service
            .create_pool(group_id, users[0], pool_request(&["A", "B"]))
            .await
            .unwrap();

        let err = service
            .lock_pool(view.pool.id, users[1], false)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied(_)));

        // An admin who is not the creator may lock.
        let view2 = service
            .create_pool(group_id, users[1], pool_request(&["A", "B"]))
            .await
            .unwrap();
        let locked = service.lock_pool(view2.pool.id, users[0], true).await.unwrap();
        assert_eq!(locked.status, PoolStatus::Locked);
    }

    #[tokio::test]
    async fn resolve_distributes_pot_proportionally() {
        let (store, service) = test_service().await;
        let (group_id, users) = seed_group(&store, &[1000, 1000, 1000]).await;
        let (a, b, c) = (users[0], users[1], users[2]);
        let view = service
            .create_pool(group_id, a, pool_request(&["Winner", "Loser"]))
            .await
            .unwrap();
        let (winner, loser) = (view.options[0].id, view.options[1].id);

        for (user, option, points) in [(a, winner, 100), (b, winner, 300), (c, loser, 200)] {
            service
                .place_bet(
                    view.pool.id,
                    user,
                    PlaceBetRequest { option_id: option, points },
                )
                .await
                .unwrap();
        }

        let resolved = service
            .resolve_pool(view.pool.id, winner, a, true)
            .await
            .unwrap();
        assert_eq!(resolved.pool.status, PoolStatus::Resolved);
        assert_eq!(resolved.pool.winning_option_id, Some(winner));
        assert!(resolved.pool.resolved_at.is_some());

        // A: 1000 − 100 + 150, B: 1000 − 300 + 450, C: 1000 − 200.
        assert_eq!(balance(&store, group_id, a).await, 1050);
        assert_eq!(balance(&store, group_id, b).await, 1150);
        assert_eq!(balance(&store, group_id, c).await, 800);

        // Conservation: the pool's wager/credit entries sum to zero.
        let mut conn = store.acquire().await.unwrap();
        let bet_ids: Vec<Uuid> = resolved.bets.iter().map(|b| *b.id.as_uuid()).collect();
        let pool_sum: i64 = queries::log_entries_by_group(&mut conn, group_id)
            .await
            .unwrap()
            .iter()
            .filter(|e| e.reference_id.is_some_and(|r| bet_ids.contains(&r)))
            .map(|e| e.amount)
            .sum();
        assert_eq!(pool_sum, 0);
    }

    #[tokio::test]
    async fn resolve_appends_zero_amount_marker() {
        let (store, service) = test_service().await;
        let (group_id, users) = seed_group(&store, &[1000]).await;
        let view = service
            .create_pool(group_id, users[0], pool_request(&["A", "B"]))
            .await
            .unwrap();
        let winner = view.options[0].id;

        service
            .resolve_pool(view.pool.id, winner, users[0], false)
            .await
            .unwrap();

        let mut conn = store.acquire().await.unwrap();
        let entries = queries::log_entries_by_group(&mut conn, group_id)
            .await
            .unwrap();
        let marker = entries
            .iter()
            .find(|e| e.entry_type == PointsLogType::PoolResolved)
            .unwrap();
        assert_eq!(marker.amount, 0);
        assert_eq!(marker.reference_id, Some(*winner.as_uuid()));
    }

    #[tokio::test]
    async fn resolve_with_no_winner_refunds_everyone() {
        let (store, service) = test_service().await;
        let (group_id, users) = seed_group(&store, &[1000, 1000]).await;
        let view = service
            .create_pool(group_id, users[0], pool_request(&["Winner", "Loser"]))
            .await
            .unwrap();
        let (winner, loser) = (view.options[0].id, view.options[1].id);

        for (user, points) in [(users[0], 250), (users[1], 17)] {
            service
                .place_bet(
                    view.pool.id,
                    user,
                    PlaceBetRequest { option_id: loser, points },
                )
                .await
                .unwrap();
        }

        service
            .resolve_pool(view.pool.id, winner, users[0], false)
            .await
            .unwrap();

        assert_eq!(balance(&store, group_id, users[0]).await, 1000);
        assert_eq!(balance(&store, group_id, users[1]).await, 1000);
    }

    #[tokio::test]
    async fn resolve_allowed_from_locked() {
        let (store, service) = test_service().await;
        let (group_id, users) = seed_group(&store, &[1000]).await;
        let view = service
            .create_pool(group_id, users[0], pool_request(&["A", "B"]))
            .await
            .unwrap();
        service
            .lock_pool(view.pool.id, users[0], false)
            .await
            .unwrap();

        let resolved = service
            .resolve_pool(view.pool.id, view.options[0].id, users[0], false)
            .await
            .unwrap();
        assert_eq!(resolved.pool.status, PoolStatus::Resolved);
    }

    #[tokio::test]
    async fn terminal_statuses_are_absorbing() {
        let (store, service) = test_service().await;
        let (group_id, users) = seed_group(&store, &[1000]).await;
        let view = service
            .create_pool(group_id, users[0], pool_request(&["A", "B"]))
            .await
            .unwrap();
        service
            .resolve_pool(view.pool.id, view.options[0].id, users[0], false)
            .await
            .unwrap();

        let err = service
            .resolve_pool(view.pool.id, view.options[0].id, users[0], false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidState {
                status: PoolStatus::Resolved
            }
        ));

        let err = service
            .cancel_pool(view.pool.id, users[0], false)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState { .. }));

        let err = service.lock_pool(view.pool.id, users[0], false).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn stale_lock_cannot_regress_a_resolved_pool() {
        let (store, service) = test_service().await;
        let (group_id, users) = seed_group(&store, &[1000]).await;
        let view = service
            .create_pool(group_id, users[0], pool_request(&["Winner", "Loser"]))
            .await
            .unwrap();
        let winner = view.options[0].id;
        service
            .place_bet(
                view.pool.id,
                users[0],
                PlaceBetRequest {
                    option_id: winner,
                    points: 100,
                },
            )
            .await
            .unwrap();

        // A lock request reads the pool while it is still open...
        let mut conn = store.acquire().await.unwrap();
        let seen = queries::pool_by_id(&mut conn, view.pool.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(seen.status, PoolStatus::Open);
        drop(conn);

        // ...and a resolve commits before the lock's update lands.
        service
            .resolve_pool(view.pool.id, winner, users[0], false)
            .await
            .unwrap();
        assert_eq!(balance(&store, group_id, users[0]).await, 1000);

        // The late update must not drag the pool back to locked.
        let mut conn = store.acquire().await.unwrap();
        let affected = queries::mark_pool_locked(&mut conn, view.pool.id)
            .await
            .unwrap();
        assert_eq!(affected, 0);
        let stored = queries::pool_by_id(&mut conn, view.pool.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PoolStatus::Resolved);
        drop(conn);

        // And the pot cannot be distributed a second time.
        let err = service
            .resolve_pool(view.pool.id, winner, users[0], false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidState {
                status: PoolStatus::Resolved
            }
        ));
        assert_eq!(balance(&store, group_id, users[0]).await, 1000);
    }

    #[tokio::test]
    async fn cancel_refunds_all_bets() {
        let (store, service) = test_service().await;
        let (group_id, users) = seed_group(&store, &[1000, 1000]).await;
        let view = service
            .create_pool(group_id, users[0], pool_request(&["A", "B"]))
            .await
            .unwrap();

        for (user, i, points) in [(users[0], 0, 400), (users[1], 1, 150)] {
            service
                .place_bet(
                    view.pool.id,
                    user,
                    PlaceBetRequest {
                        option_id: view.options[i].id,
                        points,
                    },
                )
                .await
                .unwrap();
        }

        let cancelled = service
            .cancel_pool(view.pool.id, users[0], false)
            .await
            .unwrap();
        assert_eq!(cancelled.status, PoolStatus::Cancelled);
        assert_eq!(balance(&store, group_id, users[0]).await, 1000);
        assert_eq!(balance(&store, group_id, users[1]).await, 1000);

        let mut conn = store.acquire().await.unwrap();
        let refunds = queries::log_entries_by_group(&mut conn, group_id)
            .await
            .unwrap()
            .iter()
            .filter(|e| e.entry_type == PointsLogType::BetRefund)
            .count();
        assert_eq!(refunds, 2);
    }

    #[tokio::test]
    async fn list_pools_filters_by_status() {
        let (store, service) = test_service().await;
        let (group_id, users) = seed_group(&store, &[1000]).await;
        let open = service
            .create_pool(group_id, users[0], pool_request(&["A", "B"]))
            .await
            .unwrap();
        let locked = service
            .create_pool(group_id, users[0], pool_request(&["C", "D"]))
            .await
            .unwrap();
        service
            .lock_pool(locked.pool.id, users[0], false)
            .await
            .unwrap();

        let all = service.list_pools(group_id, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let only_open = service
            .list_pools(group_id, Some(PoolStatus::Open))
            .await
            .unwrap();
        assert_eq!(only_open.len(), 1);
        assert_eq!(only_open[0].pool.id, open.pool.id);
    }
}
