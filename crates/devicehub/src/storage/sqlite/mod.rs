//! SQLite storage backend implementation.
//!
//! This module provides a pooled SQLite implementation of `DeviceRepository`
//! using `rusqlite` for synchronous operations and `tokio-rusqlite` for async wrapping.

mod conversions;
mod error;
mod pool;
mod repository;
mod schema;

pub use pool::{PoolStats, SqlitePool, SqlitePoolConfig};
pub use repository::SqliteRepository;
