//! Scoped call guard returned by [`CircuitBreaker::protect`]
//!
//! The guard is handed out once the admission check has passed. Resolving it
//! with [`CallGuard::success`], [`CallGuard::failure`] or [`CallGuard::record`]
//! runs the same bookkeeping as [`CircuitBreaker::call`]. A guard dropped
//! unresolved (early return, `?`, panic, cancelled future) counts as a failure;
//! that bookkeeping is spawned onto the current Tokio runtime since `Drop`
//! cannot await.

use crate::circuit_breaker::CircuitBreaker;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

pub struct CallGuard {
	breaker: Option<Arc<CircuitBreaker>>,
	started: Instant,
}

impl CallGuard {
	pub(crate) fn new(breaker: Arc<CircuitBreaker>) -> Self {
		Self {
			breaker: Some(breaker),
			started: Instant::now(),
		}
	}

	/// Time since the guard was acquired
	pub fn elapsed(&self) -> Duration {
		self.started.elapsed()
	}

	pub fn breaker_name(&self) -> Option<&str> {
		self.breaker.as_deref().map(CircuitBreaker::name)
	}

	pub async fn success(mut self) {
		self.resolve(true).await;
	}

	pub async fn failure(mut self) {
		self.resolve(false).await;
	}

	/// Record the outcome of `result` and hand it back unchanged
	pub async fn record<T, E>(mut self, result: Result<T, E>) -> Result<T, E> {
		self.resolve(result.is_ok()).await;
		result
	}

	async fn resolve(&mut self, success: bool) {
		if let Some(breaker) = self.breaker.take() {
			breaker.record_outcome(success, self.started.elapsed()).await;
		}
	}
}

impl Drop for CallGuard {
	fn drop(&mut self) {
		let Some(breaker) = self.breaker.take() else {
			return;
		};
		let elapsed = self.started.elapsed();

		match tokio::runtime::Handle::try_current() {
			Ok(handle) => {
				handle.spawn(async move {
					breaker.record_outcome(false, elapsed).await;
				});
			},
			Err(_) => warn!(
				breaker = %breaker.name(),
				"Call guard dropped outside a Tokio runtime, outcome not recorded"
			),
		}
	}
}

impl fmt::Debug for CallGuard {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CallGuard")
			.field("breaker", &self.breaker_name())
			.field("elapsed", &self.elapsed())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use crate::circuit_breaker::{BreakerOptions, CircuitBreaker};
	use crate::fallback::Fallback;
	use crate::invocable::direct;
	use std::sync::Arc;
	use std::time::Duration;
	use tripwire_storage::MemoryStore;
	use tripwire_types::{CircuitBreakerConfig, CircuitState};

	fn breaker(fallback: Option<Fallback>) -> Arc<CircuitBreaker> {
		let config = CircuitBreakerConfig {
			minimum_request_count: 2,
			failure_rate_threshold: 0.5,
			..Default::default()
		};
		let options = BreakerOptions {
			key_ttl: Duration::from_secs(60),
			state_cache_ttl: Duration::ZERO,
		};
		Arc::new(
			CircuitBreaker::new("speech", config, Arc::new(MemoryStore::new()), options, fallback)
				.unwrap(),
		)
	}

	async fn settle() {
		tokio::time::sleep(Duration::from_millis(50)).await;
	}

	#[tokio::test]
	async fn test_success_and_failure_are_recorded() {
		let breaker = breaker(None);

		breaker.protect().await.unwrap().success().await;
		breaker.protect().await.unwrap().failure().await;

		let metrics = breaker.get_status().await.metrics;
		assert_eq!(metrics.total_requests, 2);
		assert_eq!(metrics.successful_requests, 1);
		assert_eq!(metrics.failed_requests, 1);
	}

	#[tokio::test]
	async fn test_record_passes_result_through() {
		let breaker = breaker(None);
		let guard = breaker.protect().await.unwrap();

		let result: Result<u8, String> = guard.record(Err("timeout".to_string())).await;
		assert_eq!(result, Err("timeout".to_string()));
		assert_eq!(breaker.get_status().await.metrics.failed_requests, 1);
	}

	#[tokio::test]
	async fn test_dropped_guard_counts_as_failure() {
		let breaker = breaker(None);

		async fn upload(breaker: &Arc<CircuitBreaker>) -> Result<(), String> {
			let _guard = breaker.protect().await.map_err(|e| e.to_string())?;
			Err("upload aborted".to_string())
		}

		assert!(upload(&breaker).await.is_err());
		settle().await;

		let metrics = breaker.get_status().await.metrics;
		assert_eq!(metrics.total_requests, 1);
		assert_eq!(metrics.failed_requests, 1);
	}

	#[tokio::test]
	async fn test_protect_trips_like_call() {
		let breaker = breaker(None);

		breaker.protect().await.unwrap().failure().await;
		breaker.protect().await.unwrap().failure().await;

		assert_eq!(breaker.state().await, CircuitState::Open);
		let err = breaker.protect().await.unwrap_err();
		assert_eq!(err.name, "speech");
	}

	#[tokio::test]
	async fn test_open_protect_can_delegate_to_fallback() {
		let fallback = Fallback::new(direct(|text: String| Ok::<String, String>(text.to_uppercase())));
		let breaker = breaker(Some(fallback));
		breaker.protect().await.unwrap().failure().await;
		breaker.protect().await.unwrap().failure().await;

		assert!(breaker.protect().await.is_err());
		let result = breaker
			.invoke_fallback::<String, String, String>("cached".to_string())
			.await;
		assert_eq!(result, Some(Ok("CACHED".to_string())));
	}
}
