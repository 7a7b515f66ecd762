//! Store-backed breaker metrics
//!
//! Each counter lives under its own `circuit_metrics:{name}:{counter}` key
//! and is bumped with an atomic increment. The serialized snapshot under
//! `circuit_metrics:{name}` carries the timestamps and state fields and is
//! rewritten after every call or transition, last writer wins. Counters from
//! concurrent writers are never lost but the snapshot may briefly lag them;
//! [`MetricsStore::load`] overlays the counters on top of the snapshot.

use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tripwire_types::{CircuitMetrics, CircuitState, SharedStore};

pub(crate) fn metrics_key(name: &str) -> String {
	format!("circuit_metrics:{}", name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Counter {
	Total,
	Successful,
	Failed,
	Opened,
	HalfOpened,
}

impl Counter {
	const ALL: [Counter; 5] = [
		Counter::Total,
		Counter::Successful,
		Counter::Failed,
		Counter::Opened,
		Counter::HalfOpened,
	];

	fn as_str(&self) -> &'static str {
		match self {
			Counter::Total => "total_requests",
			Counter::Successful => "successful_requests",
			Counter::Failed => "failed_requests",
			Counter::Opened => "circuit_open_count",
			Counter::HalfOpened => "circuit_half_open_count",
		}
	}

	fn field(self, metrics: &mut CircuitMetrics) -> &mut u64 {
		match self {
			Counter::Total => &mut metrics.total_requests,
			Counter::Successful => &mut metrics.successful_requests,
			Counter::Failed => &mut metrics.failed_requests,
			Counter::Opened => &mut metrics.circuit_open_count,
			Counter::HalfOpened => &mut metrics.circuit_half_open_count,
		}
	}
}

pub(crate) struct MetricsStore {
	store: Arc<dyn SharedStore>,
	name: String,
	key: String,
	ttl: Duration,
}

impl MetricsStore {
	pub(crate) fn new(store: Arc<dyn SharedStore>, name: &str, ttl: Duration) -> Self {
		Self {
			store,
			name: name.to_string(),
			key: metrics_key(name),
			ttl,
		}
	}

	fn counter_key(&self, counter: Counter) -> String {
		format!("{}:{}", self.key, counter.as_str())
	}

	async fn bump(&self, counter: Counter) -> Option<u64> {
		let key = self.counter_key(counter);
		match self.store.incr_by(&key, 1).await {
			Ok(value) => {
				if let Err(e) = self.store.expire(&key, self.ttl).await {
					warn!(breaker = %self.name, counter = counter.as_str(), error = %e, "Failed to refresh counter expiry");
				}
				Some(value.max(0) as u64)
			},
			Err(e) => {
				warn!(breaker = %self.name, counter = counter.as_str(), error = %e, "Failed to increment counter");
				None
			},
		}
	}

	async fn read_counter(&self, counter: Counter) -> Option<u64> {
		match self.store.get(&self.counter_key(counter)).await {
			Ok(Some(raw)) => raw.trim().parse::<i64>().ok().map(|v| v.max(0) as u64),
			Ok(None) => None,
			Err(e) => {
				warn!(breaker = %self.name, counter = counter.as_str(), error = %e, "Failed to read counter");
				None
			},
		}
	}

	async fn load_snapshot(&self) -> Option<CircuitMetrics> {
		match self.store.get(&self.key).await {
			Ok(Some(raw)) => match serde_json::from_str(&raw) {
				Ok(metrics) => Some(metrics),
				Err(e) => {
					warn!(breaker = %self.name, error = %e, "Discarding unreadable metrics snapshot");
					None
				},
			},
			Ok(None) => None,
			Err(e) => {
				warn!(breaker = %self.name, error = %e, "Failed to read metrics snapshot");
				None
			},
		}
	}

	async fn save_snapshot(&self, metrics: &CircuitMetrics) {
		let raw = match serde_json::to_string(metrics) {
			Ok(raw) => raw,
			Err(e) => {
				warn!(breaker = %self.name, error = %e, "Failed to serialize metrics snapshot");
				return;
			},
		};
		if let Err(e) = self.store.set_with_ttl(&self.key, &raw, self.ttl).await {
			warn!(breaker = %self.name, error = %e, "Failed to write metrics snapshot");
		}
	}

	/// Snapshot with the atomic counters laid over it
	pub(crate) async fn load(&self, now: f64) -> CircuitMetrics {
		let mut metrics = self
			.load_snapshot()
			.await
			.unwrap_or_else(|| CircuitMetrics::new(now));
		for counter in Counter::ALL {
			if let Some(value) = self.read_counter(counter).await {
				*counter.field(&mut metrics) = value;
			}
		}
		metrics
	}

	/// Count one call outcome and refresh the snapshot
	pub(crate) async fn record_call(&self, success: bool, now: f64) -> CircuitMetrics {
		let outcome = if success {
			Counter::Successful
		} else {
			Counter::Failed
		};
		let total = self.bump(Counter::Total).await;
		let outcome_count = self.bump(outcome).await;

		let mut metrics = self.load(now).await;
		if let Some(value) = total {
			metrics.total_requests = metrics.total_requests.max(value);
		}
		if let Some(value) = outcome_count {
			let field = outcome.field(&mut metrics);
			*field = (*field).max(value);
		}
		if success {
			metrics.last_success_time = Some(now);
		} else {
			metrics.last_failure_time = Some(now);
		}

		self.save_snapshot(&metrics).await;
		metrics
	}

	/// Count a state change and stamp it onto the snapshot
	pub(crate) async fn record_transition(&self, to: CircuitState, now: f64) -> CircuitMetrics {
		match to {
			CircuitState::Open => {
				self.bump(Counter::Opened).await;
			},
			CircuitState::HalfOpen => {
				self.bump(Counter::HalfOpened).await;
			},
			CircuitState::Closed => {},
		}

		let mut metrics = self.load(now).await;
		metrics.current_state = to;
		metrics.state_changed_at = now;
		self.save_snapshot(&metrics).await;
		metrics
	}

	/// Start over with empty metrics in `state`
	pub(crate) async fn reset(&self, state: CircuitState, now: f64) -> CircuitMetrics {
		for counter in Counter::ALL {
			if let Err(e) = self.store.delete(&self.counter_key(counter)).await {
				warn!(breaker = %self.name, counter = counter.as_str(), error = %e, "Failed to clear counter");
			}
		}
		let mut metrics = CircuitMetrics::new(now);
		metrics.current_state = state;
		self.save_snapshot(&metrics).await;
		metrics
	}
}
