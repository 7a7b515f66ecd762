//! Redis storage implementation for multi-process deployments

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError};
use std::time::Duration;
use tracing::info;
use tripwire_types::storage::{SharedStore, StorageError, StorageResult};

/// Redis-backed shared store
///
/// Cloning is cheap: every clone multiplexes over the same managed connection,
/// which reconnects on its own after transient failures.
#[derive(Clone)]
pub struct RedisStore {
	connection_url: String,
	manager: ConnectionManager,
}

impl RedisStore {
	/// Connect to Redis at `connection_url`
	pub async fn connect(connection_url: &str) -> StorageResult<Self> {
		let client = redis::Client::open(connection_url).map_err(connection_error)?;
		let manager = ConnectionManager::new(client)
			.await
			.map_err(connection_error)?;
		info!("Connected to Redis shared store");
		Ok(Self {
			connection_url: connection_url.to_string(),
			manager,
		})
	}

	/// Get connection URL for debugging
	pub fn connection_url(&self) -> &str {
		&self.connection_url
	}

	fn conn(&self) -> ConnectionManager {
		self.manager.clone()
	}
}

fn connection_error(err: RedisError) -> StorageError {
	StorageError::Connection {
		message: err.to_string(),
	}
}

fn operation_error(err: RedisError) -> StorageError {
	if err.is_io_error() || err.is_connection_dropped() || err.is_timeout() {
		return connection_error(err);
	}
	StorageError::Operation {
		message: err.to_string(),
	}
}

/// Redis expiries are whole seconds; never round a TTL down to "no expiry"
fn ttl_seconds(ttl: Duration) -> u64 {
	ttl.as_secs().max(1)
}

#[async_trait]
impl SharedStore for RedisStore {
	async fn get(&self, key: &str) -> StorageResult<Option<String>> {
		self.conn().get(key).await.map_err(operation_error)
	}

	async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> StorageResult<()> {
		self.conn()
			.set_ex(key, value, ttl_seconds(ttl))
			.await
			.map_err(operation_error)
	}

	async fn delete(&self, key: &str) -> StorageResult<bool> {
		let removed: i64 = self.conn().del(key).await.map_err(operation_error)?;
		Ok(removed > 0)
	}

	async fn push_front(&self, key: &str, value: &str) -> StorageResult<usize> {
		self.conn().lpush(key, value).await.map_err(operation_error)
	}

	async fn trim(&self, key: &str, start: isize, stop: isize) -> StorageResult<()> {
		self.conn()
			.ltrim(key, start, stop)
			.await
			.map_err(operation_error)
	}

	async fn range(&self, key: &str, start: isize, stop: isize) -> StorageResult<Vec<String>> {
		self.conn()
			.lrange(key, start, stop)
			.await
			.map_err(operation_error)
	}

	async fn expire(&self, key: &str, ttl: Duration) -> StorageResult<bool> {
		let seconds = i64::try_from(ttl_seconds(ttl)).unwrap_or(i64::MAX);
		self.conn()
			.expire(key, seconds)
			.await
			.map_err(operation_error)
	}

	async fn incr_by(&self, key: &str, delta: i64) -> StorageResult<i64> {
		self.conn().incr(key, delta).await.map_err(operation_error)
	}

	async fn health_check(&self) -> StorageResult<bool> {
		let mut conn = self.conn();
		let pong: String = redis::cmd("PING")
			.query_async(&mut conn)
			.await
			.map_err(operation_error)?;
		Ok(pong == "PONG")
	}
}
