//! WebSocket layer: group rooms, fan-out, and connection pumps.
//!
//! Clients connect to `/ws/groups/{group_id}` after membership is
//! verified. Each connection gets a bounded outbound queue in the
//! [`hub::Hub`]; slow consumers are evicted rather than allowed to
//! stall the rest of the room.

pub mod handler;
pub mod hub;
pub mod session;

pub use hub::Hub;
