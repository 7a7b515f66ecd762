//! Breaker configurations and process fixtures

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use tripwire::{BreakerOptions, CircuitBreakerConfig, CircuitBreakerManager, MemoryStore};

pub struct CircuitBreakerConfigs;

impl CircuitBreakerConfigs {
	/// Trips once 5 of the last 10 calls include 60% failures
	pub fn sensitive() -> CircuitBreakerConfig {
		CircuitBreakerConfig {
			failure_threshold: 5,
			success_threshold: 2,
			timeout_seconds: 60.0,
			window_size: 10,
			minimum_request_count: 5,
			failure_rate_threshold: 0.6,
		}
	}

	/// Like `sensitive` but tries again after 200ms
	pub fn fast_recovery() -> CircuitBreakerConfig {
		CircuitBreakerConfig {
			timeout_seconds: 0.2,
			..Self::sensitive()
		}
	}
}

/// Options without a local state cache so every read hits the store
pub fn uncached_options() -> BreakerOptions {
	BreakerOptions {
		key_ttl: Duration::from_secs(60),
		state_cache_ttl: Duration::ZERO,
	}
}

/// A manager standing in for one process attached to `store`
pub fn process(store: &MemoryStore, defaults: CircuitBreakerConfig) -> CircuitBreakerManager {
	process_with_options(store, defaults, uncached_options())
}

pub fn process_with_options(
	store: &MemoryStore,
	defaults: CircuitBreakerConfig,
	options: BreakerOptions,
) -> CircuitBreakerManager {
	CircuitBreakerManager::with_defaults(Arc::new(store.clone()), defaults, options)
}

/// Sleep until an open breaker with `config` may try again
pub async fn wait_for_open_timeout(config: &CircuitBreakerConfig) {
	tokio::time::sleep(Duration::from_secs_f64(config.timeout_seconds * 2.0)).await;
}
