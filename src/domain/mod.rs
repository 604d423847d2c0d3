//! Domain layer: identifiers, entities, payout math, and events.
//!
//! Everything in here is plain data plus pure functions. Persistence
//! lives in [`crate::store`], orchestration in [`crate::service`].

pub mod event;
pub mod group;
pub mod ids;
pub mod payout;
pub mod points;
pub mod pool;

pub use event::GroupEvent;
pub use group::{Group, GroupMember, MemberRole, generate_invite_code};
pub use ids::{BetId, EntryId, GroupId, OptionId, PoolId, SessionId, UserId};
pub use payout::{CreditLine, settle};
pub use points::{PointsLogEntry, PointsLogType};
pub use pool::{Bet, Pool, PoolOption, PoolStatus, PoolView};
