//! Service layer: ledger orchestration over the store.
//!
//! Each mutating operation runs inside exactly one store transaction;
//! the caller publishes hub events only after the operation returns.

pub mod group_service;
pub mod pool_service;

pub use group_service::{
    CreateGroupRequest, GrantPointsRequest, GroupService, JoinGroupRequest, PointsHistoryPage,
};
pub use pool_service::{CreatePoolRequest, PlaceBetRequest, PoolService};
