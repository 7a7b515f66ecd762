//! Circuit breaker types and core data structures
//!
//! These are the value types a breaker persists in the shared store and
//! reports to operators. The state machine itself lives in the service crate.

mod config;
mod errors;
mod metrics;
mod window;

pub use config::{CircuitBreakerConfig, ConfigValidationError};
pub use errors::{CircuitError, CircuitOpenError};
pub use metrics::CircuitMetrics;
pub use window::{WindowEntry, WindowEntryParseError};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current wall-clock time as fractional epoch seconds
pub fn epoch_seconds() -> f64 {
	Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Circuit breaker state machine states
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
	/// Normal operation - calls flow through
	#[default]
	Closed,
	/// Dependency is failing - calls are short-circuited
	Open,
	/// Testing recovery - real calls are let through as trials
	HalfOpen,
}

impl CircuitState {
	pub fn as_str(&self) -> &'static str {
		match self {
			CircuitState::Closed => "closed",
			CircuitState::Open => "open",
			CircuitState::HalfOpen => "half_open",
		}
	}
}

impl fmt::Display for CircuitState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Authoritative `(state, metrics)` record kept under `circuit_breaker:{name}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredCircuit {
	pub state: CircuitState,
	/// Epoch seconds of the last state change
	pub changed_at: f64,
	pub metrics: CircuitMetrics,
}

impl StoredCircuit {
	/// A fresh closed circuit with empty metrics
	pub fn closed(now: f64) -> Self {
		Self {
			state: CircuitState::Closed,
			changed_at: now,
			metrics: CircuitMetrics::new(now),
		}
	}

	/// Seconds spent in the current state as of `now`
	pub fn elapsed_in_state(&self, now: f64) -> f64 {
		(now - self.changed_at).max(0.0)
	}

	/// Whether an open circuit has dwelt long enough for a trial call
	pub fn should_attempt_reset(&self, timeout_seconds: f64, now: f64) -> bool {
		self.state == CircuitState::Open && self.elapsed_in_state(now) >= timeout_seconds
	}
}

/// Read-only snapshot returned by `get_status`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CircuitBreakerStatus {
	pub name: String,
	pub state: CircuitState,
	pub config: CircuitBreakerConfig,
	pub metrics: CircuitMetrics,
	pub failure_rate: f64,
	/// Whether a call attempted right now would be let through
	pub can_execute: bool,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_circuit_state_default_is_closed() {
		assert_eq!(CircuitState::default(), CircuitState::Closed);
	}

	#[test]
	fn test_circuit_state_serialization() {
		assert_eq!(
			serde_json::to_string(&CircuitState::Closed).unwrap(),
			"\"closed\""
		);
		assert_eq!(
			serde_json::to_string(&CircuitState::Open).unwrap(),
			"\"open\""
		);
		assert_eq!(
			serde_json::to_string(&CircuitState::HalfOpen).unwrap(),
			"\"half_open\""
		);
		assert_eq!(
			serde_json::from_str::<CircuitState>("\"half_open\"").unwrap(),
			CircuitState::HalfOpen
		);
	}

	#[test]
	fn test_circuit_state_display_matches_wire_name() {
		for state in [
			CircuitState::Closed,
			CircuitState::Open,
			CircuitState::HalfOpen,
		] {
			let json = serde_json::to_string(&state).unwrap();
			assert_eq!(json.trim_matches('"'), state.to_string());
		}
	}

	#[test]
	fn test_stored_circuit_closed() {
		let stored = StoredCircuit::closed(1_000.0);
		assert_eq!(stored.state, CircuitState::Closed);
		assert_eq!(stored.changed_at, 1_000.0);
		assert_eq!(stored.metrics.total_requests, 0);
		assert_eq!(stored.metrics.current_state, CircuitState::Closed);
	}

	#[test]
	fn test_should_attempt_reset_only_when_open_and_elapsed() {
		let mut stored = StoredCircuit::closed(1_000.0);
		assert!(
			!stored.should_attempt_reset(10.0, 2_000.0),
			"Closed circuit should not attempt reset"
		);

		stored.state = CircuitState::Open;
		assert!(!stored.should_attempt_reset(10.0, 1_005.0));
		assert!(stored.should_attempt_reset(10.0, 1_010.0));

		stored.state = CircuitState::HalfOpen;
		assert!(
			!stored.should_attempt_reset(10.0, 2_000.0),
			"Half-open circuit should not attempt reset"
		);
	}

	#[test]
	fn test_elapsed_in_state_never_negative() {
		let stored = StoredCircuit::closed(1_000.0);
		// Clock skew between processes can put changed_at in the future
		assert_eq!(stored.elapsed_in_state(990.0), 0.0);
	}

	#[test]
	fn test_stored_circuit_round_trips_through_json() {
		let mut stored = StoredCircuit::closed(1_000.0);
		stored.state = CircuitState::Open;
		stored.metrics.failed_requests = 4;

		let json = serde_json::to_string(&stored).expect("Should serialize to JSON");
		assert!(json.contains("\"state\":\"open\""));

		let back: StoredCircuit = serde_json::from_str(&json).expect("Should deserialize");
		assert_eq!(back, stored);
	}
}
