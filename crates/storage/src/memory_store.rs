//! In-memory shared store using DashMap with TTL support
//!
//! Clones share the same underlying maps, so several breaker managers built on
//! clones of one `MemoryStore` behave like separate processes talking to one
//! Redis instance.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::debug;
use tripwire_types::storage::{SharedStore, StorageError, StorageResult};

#[derive(Debug, Clone)]
enum Value {
	Text(String),
	List(VecDeque<String>),
}

#[derive(Debug, Clone)]
struct StoredValue {
	value: Value,
	expires_at: Option<Instant>,
}

impl StoredValue {
	fn is_expired(&self, now: Instant) -> bool {
		self.expires_at.is_some_and(|at| at <= now)
	}
}

/// In-memory shared store with per-key TTL
#[derive(Clone, Default)]
pub struct MemoryStore {
	entries: Arc<DashMap<String, StoredValue>>,
}

impl MemoryStore {
	/// Create a new memory store instance
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of live (non-expired) keys
	pub fn len(&self) -> usize {
		let now = Instant::now();
		self.entries
			.iter()
			.filter(|entry| !entry.value().is_expired(now))
			.count()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Remaining time to live of a key, `None` if missing or persistent
	pub fn ttl(&self, key: &str) -> Option<Duration> {
		let now = Instant::now();
		self.entries.get(key).and_then(|entry| {
			if entry.is_expired(now) {
				None
			} else {
				entry.expires_at.map(|at| at.saturating_duration_since(now))
			}
		})
	}

	/// Remove expired keys manually
	pub fn cleanup_expired(&self) -> usize {
		let now = Instant::now();
		let before = self.entries.len();
		self.entries.retain(|_, stored| !stored.is_expired(now));
		let removed = before.saturating_sub(self.entries.len());
		if removed > 0 {
			debug!("Cleaned up {} expired keys", removed);
		}
		removed
	}

	/// Start the TTL cleanup task for expired keys
	pub fn start_ttl_cleanup(&self, every: Duration) -> tokio::task::JoinHandle<()> {
		let store = self.clone();
		tokio::spawn(async move {
			let mut cleanup_interval = interval(every);
			loop {
				cleanup_interval.tick().await;
				store.cleanup_expired();
			}
		})
	}

	/// Live entry for `key`, dropping it first if it has expired
	fn live_entry(&self, key: &str) -> Option<StoredValue> {
		let now = Instant::now();
		self.entries
			.remove_if(key, |_, stored| stored.is_expired(now));
		self.entries.get(key).map(|entry| entry.value().clone())
	}
}

/// Resolve a Redis-style inclusive `start..=stop` range against a list length
fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
	let len = len as isize;
	let start = if start < 0 { (len + start).max(0) } else { start };
	let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
	if len == 0 || start > stop || start >= len {
		None
	} else {
		Some((start as usize, stop as usize))
	}
}

#[async_trait]
impl SharedStore for MemoryStore {
	async fn get(&self, key: &str) -> StorageResult<Option<String>> {
		match self.live_entry(key) {
			None => Ok(None),
			Some(StoredValue {
				value: Value::Text(text),
				..
			}) => Ok(Some(text)),
			Some(_) => Err(StorageError::WrongType {
				key: key.to_string(),
			}),
		}
	}

	async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> StorageResult<()> {
		self.entries.insert(
			key.to_string(),
			StoredValue {
				value: Value::Text(value.to_string()),
				expires_at: Some(Instant::now() + ttl),
			},
		);
		Ok(())
	}

	async fn delete(&self, key: &str) -> StorageResult<bool> {
		let now = Instant::now();
		Ok(self
			.entries
			.remove(key)
			.is_some_and(|(_, stored)| !stored.is_expired(now)))
	}

	async fn push_front(&self, key: &str, value: &str) -> StorageResult<usize> {
		let now = Instant::now();
		match self.entries.entry(key.to_string()) {
			Entry::Occupied(mut occupied) => {
				if occupied.get().is_expired(now) {
					occupied.insert(StoredValue {
						value: Value::List(VecDeque::from([value.to_string()])),
						expires_at: None,
					});
					return Ok(1);
				}
				match &mut occupied.get_mut().value {
					Value::List(list) => {
						list.push_front(value.to_string());
						Ok(list.len())
					},
					Value::Text(_) => Err(StorageError::WrongType {
						key: key.to_string(),
					}),
				}
			},
			Entry::Vacant(vacant) => {
				vacant.insert(StoredValue {
					value: Value::List(VecDeque::from([value.to_string()])),
					expires_at: None,
				});
				Ok(1)
			},
		}
	}

	async fn trim(&self, key: &str, start: isize, stop: isize) -> StorageResult<()> {
		let now = Instant::now();
		let mut emptied = false;
		if let Some(mut entry) = self.entries.get_mut(key) {
			if entry.is_expired(now) {
				emptied = true;
			} else {
				match &mut entry.value {
					Value::List(list) => match resolve_range(list.len(), start, stop) {
						Some((from, to)) => {
							list.truncate(to + 1);
							list.drain(..from);
						},
						None => emptied = true,
					},
					Value::Text(_) => {
						return Err(StorageError::WrongType {
							key: key.to_string(),
						})
					},
				}
			}
		}
		if emptied {
			self.entries.remove(key);
		}
		Ok(())
	}

	async fn range(&self, key: &str, start: isize, stop: isize) -> StorageResult<Vec<String>> {
		match self.live_entry(key) {
			None => Ok(Vec::new()),
			Some(StoredValue {
				value: Value::List(list),
				..
			}) => Ok(match resolve_range(list.len(), start, stop) {
				Some((from, to)) => list.range(from..=to).cloned().collect(),
				None => Vec::new(),
			}),
			Some(_) => Err(StorageError::WrongType {
				key: key.to_string(),
			}),
		}
	}

	async fn expire(&self, key: &str, ttl: Duration) -> StorageResult<bool> {
		let now = Instant::now();
		match self.entries.get_mut(key) {
			Some(mut entry) if !entry.is_expired(now) => {
				entry.expires_at = Some(now + ttl);
				Ok(true)
			},
			_ => Ok(false),
		}
	}

	async fn incr_by(&self, key: &str, delta: i64) -> StorageResult<i64> {
		let now = Instant::now();
		let mut entry = self
			.entries
			.entry(key.to_string())
			.or_insert_with(|| StoredValue {
				value: Value::Text("0".to_string()),
				expires_at: None,
			});
		if entry.is_expired(now) {
			*entry = StoredValue {
				value: Value::Text("0".to_string()),
				expires_at: None,
			};
		}
		let current = match &entry.value {
			Value::Text(text) => text.parse::<i64>().map_err(|_| StorageError::Operation {
				message: format!("value at '{}' is not an integer", key),
			})?,
			Value::List(_) => {
				return Err(StorageError::WrongType {
					key: key.to_string(),
				})
			},
		};
		let next = current
			.checked_add(delta)
			.ok_or_else(|| StorageError::Operation {
				message: format!("increment of '{}' would overflow", key),
			})?;
		entry.value = Value::Text(next.to_string());
		Ok(next)
	}
}
