//! eConsult Storage - Caches and Persistence
//!
//! Two concerns live here:
//! - [`ResultCache`]: bounded, mutex-guarded artifact cache with FIFO eviction
//! - [`PersistenceGateway`]: append-only record store, with in-memory and
//!   SQLite implementations

pub mod cache;
pub mod gateway;
pub mod memory;
pub mod sqlite;

pub use cache::{CacheStats, ResultCache};
pub use gateway::{enforce_record_limits, PersistenceGateway};
pub use memory::InMemoryGateway;
pub use sqlite::SqliteGateway;
