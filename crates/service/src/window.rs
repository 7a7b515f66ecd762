//! Store-backed sliding window of recent call outcomes
//!
//! The window is a list under `circuit_window:{name}`, newest entry first,
//! trimmed to `window_size` after every push. Every process protecting the
//! same dependency pushes into the same list, so the failure rate is computed
//! over the last N outcomes cluster-wide.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use tripwire_types::{SharedStore, WindowEntry};

pub(crate) fn window_key(name: &str) -> String {
	format!("circuit_window:{}", name)
}

/// Failure ratio over `entries`, or 0.0 when there is too little signal
pub fn failure_rate(entries: &[WindowEntry], minimum_request_count: usize) -> f64 {
	if entries.is_empty() || entries.len() < minimum_request_count {
		return 0.0;
	}
	let failures = entries.iter().filter(|entry| !entry.success).count();
	failures as f64 / entries.len() as f64
}

pub(crate) struct SlidingWindow {
	store: Arc<dyn SharedStore>,
	name: String,
	key: String,
	window_size: usize,
	ttl: Duration,
}

impl SlidingWindow {
	pub(crate) fn new(
		store: Arc<dyn SharedStore>,
		name: &str,
		window_size: usize,
		ttl: Duration,
	) -> Self {
		Self {
			store,
			name: name.to_string(),
			key: window_key(name),
			window_size,
			ttl,
		}
	}

	/// Push an outcome and trim the list back to `window_size`
	pub(crate) async fn record(&self, entry: WindowEntry) {
		if let Err(e) = self.store.push_front(&self.key, &entry.encode()).await {
			warn!(
				breaker = %self.name,
				error = %e,
				"Failed to push sliding window entry"
			);
			return;
		}
		if let Err(e) = self
			.store
			.trim(&self.key, 0, self.window_size as isize - 1)
			.await
		{
			warn!(breaker = %self.name, error = %e, "Failed to trim sliding window");
		}
		if let Err(e) = self.store.expire(&self.key, self.ttl).await {
			warn!(breaker = %self.name, error = %e, "Failed to refresh sliding window expiry");
		}
	}

	/// The `count` most recent outcomes, newest first
	pub(crate) async fn recent(&self, count: usize) -> Vec<WindowEntry> {
		let count = count.min(self.window_size);
		if count == 0 {
			return Vec::new();
		}

		let raw = match self.store.range(&self.key, 0, count as isize - 1).await {
			Ok(raw) => raw,
			Err(e) => {
				warn!(breaker = %self.name, error = %e, "Failed to read sliding window");
				return Vec::new();
			},
		};

		raw.iter()
			.filter_map(|value| match value.parse::<WindowEntry>() {
				Ok(entry) => Some(entry),
				Err(e) => {
					debug!(breaker = %self.name, "Skipping malformed window entry: {}", e);
					None
				},
			})
			.collect()
	}

	/// Every outcome currently in the window, newest first
	pub(crate) async fn entries(&self) -> Vec<WindowEntry> {
		self.recent(self.window_size).await
	}

	pub(crate) async fn failure_rate(&self, minimum_request_count: usize) -> f64 {
		failure_rate(&self.entries().await, minimum_request_count)
	}

	/// Successes among the `count` most recent outcomes
	pub(crate) async fn recent_successes(&self, count: usize) -> usize {
		self.recent(count)
			.await
			.iter()
			.filter(|entry| entry.success)
			.count()
	}

	pub(crate) async fn clear(&self) {
		if let Err(e) = self.store.delete(&self.key).await {
			warn!(breaker = %self.name, error = %e, "Failed to clear sliding window");
		}
	}
}
