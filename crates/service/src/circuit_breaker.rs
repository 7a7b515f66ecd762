//! Distributed circuit breaker
//!
//! Every process protecting the same dependency constructs a breaker with the
//! same name against the same [`SharedStore`]. The authoritative
//! `(state, metrics)` record lives under `circuit_breaker:{name}`; each
//! process reads it through a short-lived local cache and rewrites it after
//! every recorded call and transition. Nothing is locked across processes: two replicas may
//! briefly disagree about the state, and both converge within the cache TTL.
//!
//! Store failures never reach the caller. Reads degrade to a closed circuit
//! and writes are dropped with a warning, so an unavailable store turns the
//! breaker into a pass-through rather than an outage.

use crate::fallback::{signature_of, Fallback};
use crate::guard::CallGuard;
use crate::invocable::Invocable;
use crate::metrics::MetricsStore;
use crate::window::SlidingWindow;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use tripwire_types::{
	epoch_seconds, CircuitBreakerConfig, CircuitBreakerStatus, CircuitError, CircuitMetrics,
	CircuitOpenError, CircuitState, ConfigValidationError, SharedStore, StoredCircuit, WindowEntry,
};

pub(crate) fn state_key(name: &str) -> String {
	format!("circuit_breaker:{}", name)
}

/// Store and cache tuning shared by every breaker of a manager
#[derive(Debug, Clone, PartialEq)]
pub struct BreakerOptions {
	/// Expiry armed on every key a breaker writes
	pub key_ttl: Duration,
	/// How long a state read is served from the local cache
	pub state_cache_ttl: Duration,
}

impl Default for BreakerOptions {
	fn default() -> Self {
		Self {
			key_ttl: Duration::from_secs(3600),
			state_cache_ttl: Duration::from_secs(5),
		}
	}
}

#[derive(Debug, Clone)]
struct CachedState {
	stored: StoredCircuit,
	fetched_at: Instant,
}

/// A named breaker guarding one downstream dependency
pub struct CircuitBreaker {
	name: String,
	config: CircuitBreakerConfig,
	options: BreakerOptions,
	store: Arc<dyn SharedStore>,
	state_key: String,
	window: SlidingWindow,
	metrics: MetricsStore,
	fallback: Option<Fallback>,
	cache: Mutex<Option<CachedState>>,
}

impl CircuitBreaker {
	/// Create a breaker; nothing is written to the store until first use
	pub fn new(
		name: impl Into<String>,
		config: CircuitBreakerConfig,
		store: Arc<dyn SharedStore>,
		options: BreakerOptions,
		fallback: Option<Fallback>,
	) -> Result<Self, ConfigValidationError> {
		config.validate()?;
		let name = name.into();

		Ok(Self {
			state_key: state_key(&name),
			window: SlidingWindow::new(
				Arc::clone(&store),
				&name,
				config.window_size,
				options.key_ttl,
			),
			metrics: MetricsStore::new(Arc::clone(&store), &name, options.key_ttl),
			name,
			config,
			options,
			store,
			fallback,
			cache: Mutex::new(None),
		})
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn config(&self) -> &CircuitBreakerConfig {
		&self.config
	}

	pub fn has_fallback(&self) -> bool {
		self.fallback.is_some()
	}

	/// Drop the cached state so the next read goes to the store
	pub fn invalidate_cache(&self) {
		*self.cache.lock() = None;
	}

	fn cached_state(&self) -> Option<StoredCircuit> {
		let cache = self.cache.lock();
		cache
			.as_ref()
			.filter(|cached| cached.fetched_at.elapsed() < self.options.state_cache_ttl)
			.map(|cached| cached.stored.clone())
	}

	fn cache_state(&self, stored: &StoredCircuit) {
		*self.cache.lock() = Some(CachedState {
			stored: stored.clone(),
			fetched_at: Instant::now(),
		});
	}

	/// Current record, served from the local cache when fresh.
	///
	/// A missing record reads as closed but is not written; it is created by
	/// the first recorded call.
	async fn current_state(&self) -> StoredCircuit {
		if let Some(stored) = self.cached_state() {
			return stored;
		}
		self.load_state()
			.await
			.unwrap_or_else(|| StoredCircuit::closed(epoch_seconds()))
	}

	/// Read the record from the store, bypassing the cache. `None` if the store is unreachable.
	async fn load_state(&self) -> Option<StoredCircuit> {
		match self.store.get(&self.state_key).await {
			Ok(Some(raw)) => match serde_json::from_str::<StoredCircuit>(&raw) {
				Ok(stored) => {
					self.cache_state(&stored);
					Some(stored)
				},
				Err(e) => {
					warn!(
						breaker = %self.name,
						error = %e,
						"Unreadable circuit state in store, treating as closed"
					);
					Some(StoredCircuit::closed(epoch_seconds()))
				},
			},
			Ok(None) => {
				let fresh = StoredCircuit::closed(epoch_seconds());
				self.cache_state(&fresh);
				Some(fresh)
			},
			Err(e) => {
				warn!(
					breaker = %self.name,
					error = %e,
					"Failed to read circuit state, failing open"
				);
				None
			},
		}
	}

	/// Write a record to the store and the local cache
	async fn persist_state(&self, stored: &StoredCircuit) {
		self.cache_state(stored);

		let raw = match serde_json::to_string(stored) {
			Ok(raw) => raw,
			Err(e) => {
				warn!(breaker = %self.name, error = %e, "Failed to serialize circuit state");
				return;
			},
		};
		if let Err(e) = self
			.store
			.set_with_ttl(&self.state_key, &raw, self.options.key_ttl)
			.await
		{
			warn!(breaker = %self.name, error = %e, "Failed to write circuit state");
		}
	}

	async fn transition(&self, from: CircuitState, to: CircuitState, reason: &str) -> StoredCircuit {
		let now = epoch_seconds();
		let metrics = self.metrics.record_transition(to, now).await;
		let stored = StoredCircuit {
			state: to,
			changed_at: now,
			metrics,
		};
		self.persist_state(&stored).await;

		match to {
			CircuitState::Open => warn!(
				breaker = %self.name,
				from = %from,
				to = %to,
				reason,
				"Circuit breaker '{}' opened (retry in {}s)",
				self.name,
				self.config.timeout_seconds
			),
			CircuitState::HalfOpen => info!(
				breaker = %self.name,
				from = %from,
				to = %to,
				reason,
				"Circuit breaker '{}' half-open, probing recovery",
				self.name
			),
			CircuitState::Closed => info!(
				breaker = %self.name,
				from = %from,
				to = %to,
				reason,
				"Circuit breaker '{}' closed - recovery complete",
				self.name
			),
		}

		stored
	}

	/// Admission check run before every protected call.
	///
	/// An open circuit whose timeout has elapsed moves to half-open here, so
	/// recovery only happens when someone actually tries to call through.
	pub(crate) async fn acquire(&self) -> Result<CircuitState, CircuitOpenError> {
		let stored = self.current_state().await;
		match stored.state {
			CircuitState::Open => {
				if stored.should_attempt_reset(self.config.timeout_seconds, epoch_seconds()) {
					let probing = self
						.transition(
							CircuitState::Open,
							CircuitState::HalfOpen,
							"open timeout elapsed",
						)
						.await;
					Ok(probing.state)
				} else {
					Err(CircuitOpenError::new(&self.name))
				}
			},
			state => Ok(state),
		}
	}

	/// Bookkeeping after a call that was let through.
	///
	/// The record is re-read from the store rather than the cache before it is
	/// rewritten with the new metrics, so a transition made by another process
	/// is not overwritten with a stale state.
	pub(crate) async fn record_outcome(&self, success: bool, duration: Duration) {
		let now = epoch_seconds();
		debug!(
			breaker = %self.name,
			duration_ms = duration.as_secs_f64() * 1000.0,
			success,
			"Circuit breaker call completed"
		);

		let metrics = self.metrics.record_call(success, now).await;
		self.window.record(WindowEntry::new(now, success)).await;

		let Some(mut stored) = self.load_state().await else {
			return;
		};
		stored.metrics = CircuitMetrics {
			current_state: stored.state,
			state_changed_at: stored.changed_at,
			..metrics
		};
		self.persist_state(&stored).await;

		if success {
			self.on_success(stored.state).await;
		} else {
			self.on_failure(stored.state).await;
		}
	}

	async fn on_success(&self, state: CircuitState) {
		if state != CircuitState::HalfOpen {
			return;
		}

		let required = self.config.success_threshold as usize;
		let successes = self.window.recent_successes(required).await;
		if successes >= required {
			let reason = format!("{} consecutive successful trial calls", successes);
			self.transition(CircuitState::HalfOpen, CircuitState::Closed, &reason)
				.await;
		} else {
			debug!(
				breaker = %self.name,
				"Half-open trial call succeeded ({}/{} successes)",
				successes,
				required
			);
		}
	}

	async fn on_failure(&self, state: CircuitState) {
		match state {
			CircuitState::Closed => {
				let rate = self
					.window
					.failure_rate(self.config.minimum_request_count)
					.await;
				if rate > 0.0 && rate >= self.config.failure_rate_threshold {
					let reason = format!(
						"failure rate {:.2} reached threshold {:.2}",
						rate, self.config.failure_rate_threshold
					);
					self.transition(CircuitState::Closed, CircuitState::Open, &reason)
						.await;
				}
			},
			CircuitState::HalfOpen => {
				self.transition(
					CircuitState::HalfOpen,
					CircuitState::Open,
					"trial call failed while half-open",
				)
				.await;
			},
			CircuitState::Open => {},
		}
	}

	/// Run `invocable` through the breaker.
	///
	/// The wrapped error is returned unchanged as [`CircuitError::Call`]. When
	/// the circuit is open the registered fallback runs with `args` instead; a
	/// fallback error is returned as [`CircuitError::Call`] too. Without a
	/// usable fallback the result is [`CircuitError::Open`].
	pub async fn call<A, I>(
		&self,
		invocable: &I,
		args: A,
	) -> Result<I::Output, CircuitError<I::Error>>
	where
		A: Send + 'static,
		I: Invocable<A> + ?Sized,
	{
		if let Err(open) = self.acquire().await {
			debug!(
				breaker = %self.name,
				fallback = self.fallback.is_some(),
				"Call short-circuited"
			);
			return match self.invoke_fallback::<A, I::Output, I::Error>(args).await {
				Some(result) => result.map_err(CircuitError::Call),
				None => Err(CircuitError::Open(open)),
			};
		}

		let started = Instant::now();
		let result = invocable.invoke(args).await;
		self.record_outcome(result.is_ok(), started.elapsed()).await;
		result.map_err(CircuitError::Call)
	}

	/// Acquire a guard for a call site that cannot be wrapped in one callable.
	///
	/// The guard records the outcome when resolved and counts a failure if it
	/// is dropped unresolved. An open circuit returns the error instead; the
	/// caller may then use [`CircuitBreaker::invoke_fallback`].
	pub async fn protect(self: &Arc<Self>) -> Result<CallGuard, CircuitOpenError> {
		self.acquire().await?;
		Ok(CallGuard::new(Arc::clone(self)))
	}

	/// Run the registered fallback with `args`.
	///
	/// `None` when no fallback is registered or it was registered for a
	/// different `(A, T, E)` signature.
	pub async fn invoke_fallback<A, T, E>(&self, args: A) -> Option<Result<T, E>>
	where
		A: Send + 'static,
		T: Send + 'static,
		E: Send + 'static,
	{
		let fallback = self.fallback.as_ref()?;
		match fallback.resolve::<A, T, E>() {
			Some(handler) => {
				debug!(breaker = %self.name, "Invoking fallback");
				Some(handler.invoke(args).await)
			},
			None => {
				warn!(
					breaker = %self.name,
					registered = fallback.signature(),
					requested = signature_of::<A, T, E>(),
					"Fallback signature does not match call site, ignoring fallback"
				);
				None
			},
		}
	}

	pub async fn state(&self) -> CircuitState {
		self.current_state().await.state
	}

	/// Sliding-window failure rate (0.0 below the minimum request count)
	pub async fn failure_rate(&self) -> f64 {
		self.window
			.failure_rate(self.config.minimum_request_count)
			.await
	}

	/// Whether a call attempted right now would be let through
	pub async fn can_execute(&self) -> bool {
		let stored = self.current_state().await;
		match stored.state {
			CircuitState::Open => {
				stored.should_attempt_reset(self.config.timeout_seconds, epoch_seconds())
			},
			_ => true,
		}
	}

	/// Read-only status snapshot; never writes to the store
	pub async fn get_status(&self) -> CircuitBreakerStatus {
		let stored = self.current_state().await;
		let now = epoch_seconds();

		let mut metrics = self.metrics.load(now).await;
		metrics.current_state = stored.state;
		metrics.state_changed_at = stored.changed_at;

		let can_execute = match stored.state {
			CircuitState::Open => stored.should_attempt_reset(self.config.timeout_seconds, now),
			_ => true,
		};

		CircuitBreakerStatus {
			name: self.name.clone(),
			state: stored.state,
			config: self.config.clone(),
			metrics,
			failure_rate: self.failure_rate().await,
			can_execute,
		}
	}

	/// Force the circuit closed and clear its metrics and window
	pub async fn reset(&self) {
		let previous = self.current_state().await.state;
		let closed = CircuitState::Closed;
		let now = epoch_seconds();

		self.window.clear().await;
		let metrics = self.metrics.reset(closed, now).await;
		self.persist_state(&StoredCircuit {
			state: closed,
			changed_at: now,
			metrics,
		})
		.await;

		info!(
			breaker = %self.name,
			from = %previous,
			to = %closed,
			reason = "manual reset",
			"Circuit breaker '{}' reset",
			self.name
		);
	}
}

impl fmt::Debug for CircuitBreaker {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CircuitBreaker")
			.field("name", &self.name)
			.field("config", &self.config)
			.field("options", &self.options)
			.field("fallback", &self.fallback)
			.finish_non_exhaustive()
	}
}
