//! Per-breaker tunables

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Immutable tuning parameters for one circuit breaker
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CircuitBreakerConfig {
	/// Raw failure count. Informational only: tripping is decided by
	/// `failure_rate_threshold` over the sliding window.
	#[serde(default = "default_failure_threshold")]
	pub failure_threshold: u32,
	/// Successes among the most recent window entries needed to close a half-open circuit
	#[serde(default = "default_success_threshold")]
	pub success_threshold: u32,
	/// Minimum dwell time in the open state before a trial call is allowed
	#[serde(default = "default_timeout_seconds")]
	pub timeout_seconds: f64,
	/// Maximum number of outcomes kept in the sliding window
	#[serde(default = "default_window_size")]
	pub window_size: usize,
	/// Outcomes required in the window before its failure rate is trusted
	#[serde(default = "default_minimum_request_count")]
	pub minimum_request_count: usize,
	/// Failure rate in (0, 1] at which a closed circuit trips
	#[serde(default = "default_failure_rate_threshold")]
	pub failure_rate_threshold: f64,
}

impl Default for CircuitBreakerConfig {
	fn default() -> Self {
		Self {
			failure_threshold: default_failure_threshold(),
			success_threshold: default_success_threshold(),
			timeout_seconds: default_timeout_seconds(),
			window_size: default_window_size(),
			minimum_request_count: default_minimum_request_count(),
			failure_rate_threshold: default_failure_rate_threshold(),
		}
	}
}

impl CircuitBreakerConfig {
	/// Reject combinations that would leave the breaker unable to trip or recover
	pub fn validate(&self) -> Result<(), ConfigValidationError> {
		if self.window_size == 0 {
			return Err(ConfigValidationError::ZeroWindowSize);
		}
		if self.success_threshold == 0 {
			return Err(ConfigValidationError::ZeroSuccessThreshold);
		}
		if !(self.failure_rate_threshold > 0.0 && self.failure_rate_threshold <= 1.0) {
			return Err(ConfigValidationError::InvalidFailureRate {
				value: self.failure_rate_threshold,
			});
		}
		if !self.timeout_seconds.is_finite() || self.timeout_seconds < 0.0 {
			return Err(ConfigValidationError::InvalidTimeout {
				value: self.timeout_seconds,
			});
		}
		if self.minimum_request_count > self.window_size {
			return Err(ConfigValidationError::ExceedsWindow {
				field: "minimum_request_count",
				value: self.minimum_request_count,
				window_size: self.window_size,
			});
		}
		if self.success_threshold as usize > self.window_size {
			return Err(ConfigValidationError::ExceedsWindow {
				field: "success_threshold",
				value: self.success_threshold as usize,
				window_size: self.window_size,
			});
		}
		Ok(())
	}
}

/// Validation errors for breaker configurations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
	#[error("window_size must be at least 1")]
	ZeroWindowSize,

	#[error("success_threshold must be at least 1")]
	ZeroSuccessThreshold,

	#[error("failure_rate_threshold must be in (0, 1], got {value}")]
	InvalidFailureRate { value: f64 },

	#[error("timeout_seconds must be a finite, non-negative number, got {value}")]
	InvalidTimeout { value: f64 },

	#[error("{field} ({value}) cannot exceed window_size ({window_size})")]
	ExceedsWindow {
		field: &'static str,
		value: usize,
		window_size: usize,
	},
}

fn default_failure_threshold() -> u32 {
	5
}

fn default_success_threshold() -> u32 {
	3
}

fn default_timeout_seconds() -> f64 {
	60.0
}

fn default_window_size() -> usize {
	100
}

fn default_minimum_request_count() -> usize {
	10
}

fn default_failure_rate_threshold() -> f64 {
	0.5
}
