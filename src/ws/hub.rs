//! Connection registry and group-scoped event fan-out.

use std::collections::HashMap;
use std::sync::RwLock;

use axum::extract::ws::Utf8Bytes;
use tokio::sync::mpsc;

use crate::domain::{GroupEvent, GroupId, SessionId};

/// Per-group connection registry.
///
/// Every live connection owns a bounded [`mpsc`] queue keyed by session
/// id inside its group's room. Broadcasting never awaits: a queue that
/// is full or whose receiver is gone gets the session evicted on the
/// spot, so one stalled client cannot hold up the room.
#[derive(Debug)]
pub struct Hub {
    rooms: RwLock<HashMap<GroupId, HashMap<SessionId, mpsc::Sender<Utf8Bytes>>>>,
    queue_capacity: usize,
}

impl Hub {
    /// Creates a hub whose per-session queues hold `queue_capacity`
    /// pending messages.
    #[must_use]
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Adds a session to a group's room and returns the receiving end
    /// of its outbound queue. Registering an already-known session
    /// replaces its queue.
    pub fn register(&self, group_id: GroupId, session_id: SessionId) -> mpsc::Receiver<Utf8Bytes> {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let mut rooms = match self.rooms.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        rooms.entry(group_id).or_default().insert(session_id, tx);
        rx
    }

    /// Removes a session from its group's room. Unknown sessions are a
    /// no-op, so the disconnect path can call this unconditionally.
    /// Empty rooms are dropped from the map.
    pub fn unregister(&self, group_id: GroupId, session_id: SessionId) {
        let mut rooms = match self.rooms.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(room) = rooms.get_mut(&group_id) {
            room.remove(&session_id);
            if room.is_empty() {
                rooms.remove(&group_id);
            }
        }
    }

    /// Serializes `event` once and offers it to every session in the
    /// group's room. Sessions whose queue is full or closed are
    /// evicted. Returns the number of sessions that accepted the
    /// message.
    pub fn broadcast_to_group(&self, group_id: GroupId, event: &GroupEvent) -> usize {
        let text: Utf8Bytes = match serde_json::to_string(event) {
            Ok(json) => json.into(),
            Err(err) => {
                // Fail closed: a partial room delivery would be worse
                // than none.
                tracing::error!(%group_id, error = %err, "failed to serialize group event");
                return 0;
            }
        };

        let targets: Vec<(SessionId, mpsc::Sender<Utf8Bytes>)> = {
            let rooms = match self.rooms.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            match rooms.get(&group_id) {
                Some(room) => room
                    .iter()
                    .map(|(id, tx)| (*id, tx.clone()))
                    .collect(),
                None => return 0,
            }
        };

        let mut delivered = 0;
        let mut stale = Vec::new();
        for (session_id, tx) in targets {
            match tx.try_send(text.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(%group_id, %session_id, "evicting slow ws session");
                    stale.push(session_id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => stale.push(session_id),
            }
        }
        for session_id in stale {
            self.unregister(group_id, session_id);
        }
        delivered
    }

    /// Number of sessions currently in a group's room.
    #[must_use]
    pub fn room_size(&self, group_id: GroupId) -> usize {
        let rooms = match self.rooms.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        rooms.get(&group_id).map_or(0, HashMap::len)
    }

    /// Number of groups with at least one live session.
    #[must_use]
    pub fn room_count(&self) -> usize {
        let rooms = match self.rooms.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        rooms.len()
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::PoolId;

    fn lock_event() -> GroupEvent {
        GroupEvent::PoolLocked {
            pool_id: PoolId::new(),
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_every_room_member() {
        let hub = Hub::new(8);
        let group = GroupId::new();
        let mut rx_a = hub.register(group, SessionId::new());
        let mut rx_b = hub.register(group, SessionId::new());

        let delivered = hub.broadcast_to_group(group, &lock_event());
        assert_eq!(delivered, 2);

        let text = rx_a.try_recv().unwrap();
        assert!(text.as_str().contains("pool_locked"));
        rx_b.try_recv().unwrap();
    }

    #[tokio::test]
    async fn broadcast_is_scoped_to_the_group() {
        let hub = Hub::new(8);
        let group_a = GroupId::new();
        let group_b = GroupId::new();
        let mut rx_a = hub.register(group_a, SessionId::new());
        let mut rx_b = hub.register(group_b, SessionId::new());

        assert_eq!(hub.broadcast_to_group(group_a, &lock_event()), 1);
        rx_a.try_recv().unwrap();
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn broadcast_to_empty_room_is_a_no_op() {
        let hub = Hub::new(8);
        assert_eq!(hub.broadcast_to_group(GroupId::new(), &lock_event()), 0);
    }

    #[tokio::test]
    async fn slow_session_is_evicted_while_healthy_one_survives() {
        let hub = Hub::new(1);
        let group = GroupId::new();
        let slow = SessionId::new();
        let healthy = SessionId::new();
        let _rx_slow = hub.register(group, slow);
        let mut rx_healthy = hub.register(group, healthy);

        // First broadcast fills both single-slot queues.
        assert_eq!(hub.broadcast_to_group(group, &lock_event()), 2);
        // Only the healthy session drains its queue.
        rx_healthy.try_recv().unwrap();

        // Second broadcast finds the slow queue full and evicts it.
        assert_eq!(hub.broadcast_to_group(group, &lock_event()), 1);
        assert_eq!(hub.room_size(group), 1);
        rx_healthy.try_recv().unwrap();
    }

    #[tokio::test]
    async fn dropped_receiver_is_evicted_on_next_broadcast() {
        let hub = Hub::new(8);
        let group = GroupId::new();
        let session = SessionId::new();
        let rx = hub.register(group, session);
        drop(rx);

        assert_eq!(hub.broadcast_to_group(group, &lock_event()), 0);
        assert_eq!(hub.room_size(group), 0);
        assert_eq!(hub.room_count(), 0);
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let hub = Hub::new(8);
        let group = GroupId::new();
        let session = SessionId::new();
        let _rx = hub.register(group, session);

        hub.unregister(group, session);
        hub.unregister(group, session);
        assert_eq!(hub.room_size(group), 0);
    }

    #[tokio::test]
    async fn re_registering_replaces_the_queue() {
        let hub = Hub::new(8);
        let group = GroupId::new();
        let session = SessionId::new();
        let mut old_rx = hub.register(group, session);
        let mut new_rx = hub.register(group, session);

        assert_eq!(hub.room_size(group), 1);
        assert_eq!(hub.broadcast_to_group(group, &lock_event()), 1);
        assert!(old_rx.try_recv().is_err());
        new_rx.try_recv().unwrap();
    }
}
