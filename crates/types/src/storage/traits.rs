//! Store trait for pluggable shared-state backends
//!
//! Every breaker process talks to the same store through this trait. The
//! operations mirror a small subset of Redis: TTL'd string values, a list per
//! key with head pushes and index-range trims/reads, expiry and atomic
//! increments. No operation spans more than one key.

use crate::storage::StorageResult;
use async_trait::async_trait;
use std::time::Duration;

/// Key/value and list operations a circuit breaker needs from its shared store
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait SharedStore: Send + Sync {
	/// Get a string value
	async fn get(&self, key: &str) -> StorageResult<Option<String>>;

	/// Set a string value that expires after `ttl`
	async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> StorageResult<()>;

	/// Delete a key of any kind, returning whether it existed
	async fn delete(&self, key: &str) -> StorageResult<bool>;

	/// Push a value onto the head of a list, returning the new length
	async fn push_front(&self, key: &str, value: &str) -> StorageResult<usize>;

	/// Keep only the inclusive index range `start..=stop` of a list.
	/// Negative indices count from the tail.
	async fn trim(&self, key: &str, start: isize, stop: isize) -> StorageResult<()>;

	/// Read the inclusive index range `start..=stop` of a list (head first).
	/// Negative indices count from the tail.
	async fn range(&self, key: &str, start: isize, stop: isize) -> StorageResult<Vec<String>>;

	/// Set the expiry of an existing key, returning whether the key existed
	async fn expire(&self, key: &str, ttl: Duration) -> StorageResult<bool>;

	/// Atomically add `delta` to an integer value (missing keys start at 0)
	async fn incr_by(&self, key: &str, delta: i64) -> StorageResult<i64>;

	/// Health check for the store connection
	async fn health_check(&self) -> StorageResult<bool> {
		Ok(true)
	}
}
