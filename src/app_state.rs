//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::{GroupService, PoolService};
use crate::ws::Hub;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Group and membership operations.
    pub groups: Arc<GroupService>,
    /// Pool lifecycle and betting operations.
    pub pools: Arc<PoolService>,
    /// WebSocket room registry and event fan-out.
    pub hub: Arc<Hub>,
}
