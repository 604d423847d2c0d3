//! Pot settlement math.
//!
//! [`settle`] is a pure function from a pool's bets to the exact list of
//! credits to apply. Keeping it out of the transaction code makes the
//! conservation invariant directly testable: the credits always sum to
//! the total pot, for any distribution of wagers and winners.

use super::pool::Bet;
use super::points::PointsLogType;
use super::{BetId, OptionId, UserId};

/// One credit to apply during settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditLine {
    /// The bet being paid out or refunded.
    pub bet_id: BetId,
    /// Receiving user.
    pub user_id: UserId,
    /// Credit amount, always positive.
    pub amount: i64,
    /// `BetWon` for winnings, `BetRefund` for refunds.
    pub entry_type: PointsLogType,
}

/// Result of settling a pool against a winning option.
#[derive(Debug, Clone)]
pub struct Settlement {
    /// Credits to apply, in the bets' iteration order.
    pub credits: Vec<CreditLine>,
    /// Sum of all wagers on the pool.
    pub total_pot: i64,
    /// Sum of wagers on the winning option.
    pub total_winning_wagers: i64,
}

/// Computes the settlement for a pool.
///
/// When no bet targets the winning option, every bettor is refunded
/// their own wager in full. Otherwise each winning bet receives
/// `floor(wager × total_pot / total_winning_wagers)`, except the last
/// winner in iteration order, which receives the remainder of the pot —
/// guaranteeing the credits sum exactly to the pot despite integer
/// truncation. Losing bets receive nothing.
///
/// `bets` must be in a stable order (the store returns them in creation
/// order); only the remainder holder depends on it, never the total.
#[must_use]
pub fn settle(bets: &[Bet], winning_option: OptionId) -> Settlement {
    let total_pot: i64 = bets.iter().map(|b| b.points_wagered).sum();
    let total_winning_wagers: i64 = bets
        .iter()
        .filter(|b| b.option_id == winning_option)
        .map(|b| b.points_wagered)
        .sum();

    let credits = if total_winning_wagers == 0 {
        // Nobody picked the winner: refund everyone their own wager.
        bets.iter()
            .map(|b| CreditLine {
                bet_id: b.id,
                user_id: b.user_id,
                amount: b.points_wagered,
                entry_type: PointsLogType::BetRefund,
            })
            .collect()
    } else {
        let winners: Vec<&Bet> = bets
            .iter()
            .filter(|b| b.option_id == winning_option)
            .collect();
        let last = winners.len().saturating_sub(1);
        let mut distributed: i64 = 0;
        winners
            .iter()
            .enumerate()
            .map(|(i, b)| {
                let amount = if i == last {
                    total_pot - distributed
                } else {
                    b.points_wagered * total_pot / total_winning_wagers
                };
                distributed += amount;
                CreditLine {
                    bet_id: b.id,
                    user_id: b.user_id,
                    amount,
                    entry_type: PointsLogType::BetWon,
                }
            })
            .collect()
    };

    Settlement {
        credits,
        total_pot,
        total_winning_wagers,
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::PoolId;

    fn bet(user: UserId, option: OptionId, wager: i64) -> Bet {
        Bet {
            id: BetId::new(),
            pool_id: PoolId::from_uuid(uuid::Uuid::nil()),
            user_id: user,
            option_id: option,
            points_wagered: wager,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn proportional_split_is_exact() {
        let winner = OptionId::new();
        let loser = OptionId::new();
        let (a, b, c) = (UserId::new(), UserId::new(), UserId::new());
        let bets = vec![bet(a, winner, 100), bet(b, winner, 300), bet(c, loser, 200)];

        let settlement = settle(&bets, winner);
        assert_eq!(settlement.total_pot, 600);
        assert_eq!(settlement.total_winning_wagers, 400);

        // 100/400 × 600 = 150 and 300/400 × 600 = 450, no off-by-one loss.
        let amounts: Vec<i64> = settlement.credits.iter().map(|c| c.amount).collect();
        assert_eq!(amounts, vec![150, 450]);
        assert!(
            settlement
                .credits
                .iter()
                .all(|c| c.entry_type == PointsLogType::BetWon)
        );
        assert!(!settlement.credits.iter().any(|line| line.user_id == c));
    }

    #[test]
    fn remainder_goes_to_last_winner() {
        let winner = OptionId::new();
        let loser = OptionId::new();
        let bets = vec![
            bet(UserId::new(), winner, 100),
            bet(UserId::new(), winner, 100),
            bet(UserId::new(), winner, 100),
            bet(UserId::new(), loser, 100),
        ];

        // floor(100 × 400 / 300) = 133; the last winner takes 400 − 266.
        let settlement = settle(&bets, winner);
        let amounts: Vec<i64> = settlement.credits.iter().map(|c| c.amount).collect();
        assert_eq!(amounts, vec![133, 133, 134]);
    }

    #[test]
    fn no_winner_refunds_everyone_in_full() {
        let winner = OptionId::new();
        let loser = OptionId::new();
        let bets = vec![
            bet(UserId::new(), loser, 250),
            bet(UserId::new(), loser, 17),
        ];

        let settlement = settle(&bets, winner);
        assert_eq!(settlement.total_winning_wagers, 0);
        assert_eq!(settlement.credits.len(), 2);
        for (line, original) in settlement.credits.iter().zip(&bets) {
            assert_eq!(line.amount, original.points_wagered);
            assert_eq!(line.entry_type, PointsLogType::BetRefund);
            assert_eq!(line.bet_id, original.id);
        }
    }

    #[test]
    fn single_winner_takes_whole_pot() {
        let winner = OptionId::new();
        let loser = OptionId::new();
        let lucky = UserId::new();
        let bets = vec![
            bet(lucky, winner, 1),
            bet(UserId::new(), loser, 999),
        ];

        let settlement = settle(&bets, winner);
        assert_eq!(settlement.credits.len(), 1);
        let Some(line) = settlement.credits.first() else {
            panic!("expected one credit");
        };
        assert_eq!(line.user_id, lucky);
        assert_eq!(line.amount, 1000);
    }

    #[test]
    fn conservation_holds_across_distributions() {
        let winner = OptionId::new();
        let loser = OptionId::new();
        let cases: Vec<Vec<(bool, i64)>> = vec![
            vec![(true, 1), (true, 1), (true, 1)],
            vec![(true, 7), (false, 13), (true, 29), (false, 5)],
            vec![(false, 100), (false, 200)],
            vec![(true, 1000)],
            vec![(true, 3), (true, 5), (true, 7), (false, 11), (true, 2)],
            vec![(false, 1), (true, 1), (false, 1), (true, 999)],
        ];

        for wagers in cases {
            let bets: Vec<Bet> = wagers
                .iter()
                .map(|&(wins, amount)| {
                    bet(UserId::new(), if wins { winner } else { loser }, amount)
                })
                .collect();
            let settlement = settle(&bets, winner);
            let credited: i64 = settlement.credits.iter().map(|c| c.amount).sum();
            assert_eq!(credited, settlement.total_pot, "leaked on {wagers:?}");
        }
    }

    #[test]
    fn empty_pool_settles_to_nothing() {
        let settlement = settle(&[], OptionId::new());
        assert!(settlement.credits.is_empty());
        assert_eq!(settlement.total_pot, 0);
    }
}
