//! Storage layer: SQLite schema and query accessors.
//!
//! [`Store`] wraps a `sqlx::SqlitePool` and owns schema migration. The
//! accessor functions in [`queries`] take a `&mut SqliteConnection` so
//! the services can compose them inside one transaction per ledger
//! operation; an early `?` return drops the transaction and rolls back
//! every partial write.

pub mod queries;
pub mod sqlite;

pub use sqlite::Store;
