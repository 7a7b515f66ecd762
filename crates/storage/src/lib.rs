//! Tripwire Storage
//!
//! Shared store backends for circuit breaker state.
//! Supports an in-process memory store and Redis.

pub mod memory_store;

#[cfg(feature = "redis")]
pub mod redis_store;

pub use memory_store::MemoryStore;
pub use tripwire_types::storage::{SharedStore, StorageError, StorageResult};

#[cfg(feature = "redis")]
pub use redis_store::RedisStore;
