//! Aggregate counters persisted per breaker

use super::CircuitState;
use serde::{Deserialize, Serialize};

/// Counters and state snapshot for one breaker.
///
/// Counters are best-effort under concurrent writers: each one is bumped with
/// its own atomic store increment, so the fields are never updated together
/// as a transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CircuitMetrics {
	pub total_requests: u64,
	pub successful_requests: u64,
	pub failed_requests: u64,
	pub circuit_open_count: u64,
	pub circuit_half_open_count: u64,
	/// Epoch seconds of the most recent failed call
	pub last_failure_time: Option<f64>,
	/// Epoch seconds of the most recent successful call
	pub last_success_time: Option<f64>,
	pub current_state: CircuitState,
	/// Epoch seconds of the last state change
	pub state_changed_at: f64,
}

impl CircuitMetrics {
	pub fn new(now: f64) -> Self {
		Self {
			state_changed_at: now,
			..Default::default()
		}
	}

	/// Lifetime failure ratio; 0.0 before any request
	pub fn lifetime_failure_rate(&self) -> f64 {
		if self.total_requests == 0 {
			0.0
		} else {
			self.failed_requests as f64 / self.total_requests as f64
		}
	}
}
