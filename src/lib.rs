//! # groupbets
//!
//! Server for group prediction pools wagered with a shared, non-monetary
//! points currency. Members create pools with two or more options, place
//! a single irrevocable bet each, and the pot is distributed
//! proportionally to the winners when the pool resolves. Every balance
//! change is recorded in an append-only points log, and all state changes
//! are fanned out in real time to connected group members over WebSocket.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Upgrade + Session Pumps (ws/)
//!     │
//!     ├── PoolService / GroupService (service/)
//!     ├── Hub (ws/hub.rs)
//!     │
//!     ├── Domain model + payout math (domain/)
//!     │
//!     └── SQLite store (store/)
//! ```
//!
//! The ledger services execute each operation inside one store
//! transaction; handlers publish the corresponding [`domain::GroupEvent`]
//! to the [`ws::Hub`] only after the transaction commits. The hub never
//! participates in a ledger transaction.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod store;
pub mod ws;
