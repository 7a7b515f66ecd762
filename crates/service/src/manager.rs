//! Per-process registry of circuit breakers
//!
//! The manager guarantees one [`CircuitBreaker`] object per name inside a
//! process. It is an identity cache, not a lock: the shared store stays the
//! cross-process source of truth. Construct one per process and inject it
//! where breakers are needed.

use crate::circuit_breaker::{BreakerOptions, CircuitBreaker};
use crate::fallback::Fallback;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use tripwire_types::{
	CircuitBreakerConfig, CircuitBreakerStatus, ConfigValidationError, SharedStore,
};

pub struct CircuitBreakerManager {
	store: Arc<dyn SharedStore>,
	defaults: CircuitBreakerConfig,
	overrides: HashMap<String, CircuitBreakerConfig>,
	options: BreakerOptions,
	breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl CircuitBreakerManager {
	/// Manager with default breaker configuration and options
	pub fn new(store: Arc<dyn SharedStore>) -> Self {
		Self::with_defaults(store, CircuitBreakerConfig::default(), BreakerOptions::default())
	}

	pub fn with_defaults(
		store: Arc<dyn SharedStore>,
		defaults: CircuitBreakerConfig,
		options: BreakerOptions,
	) -> Self {
		Self {
			store,
			defaults,
			overrides: HashMap::new(),
			options,
			breakers: DashMap::new(),
		}
	}

	/// Configuration used for `name` when `get_or_create` is given none
	pub fn with_overrides(mut self, overrides: HashMap<String, CircuitBreakerConfig>) -> Self {
		self.overrides = overrides;
		self
	}

	pub fn store(&self) -> Arc<dyn SharedStore> {
		Arc::clone(&self.store)
	}

	pub fn options(&self) -> &BreakerOptions {
		&self.options
	}

	/// Configuration a new breaker called `name` would get
	pub fn config_for(&self, name: &str) -> CircuitBreakerConfig {
		self.overrides
			.get(name)
			.cloned()
			.unwrap_or_else(|| self.defaults.clone())
	}

	/// The breaker registered under `name`, creating it on first use.
	///
	/// Later calls return the original instance and ignore `config` and
	/// `fallback`.
	pub fn get_or_create(
		&self,
		name: &str,
		config: Option<CircuitBreakerConfig>,
		fallback: Option<Fallback>,
	) -> Result<Arc<CircuitBreaker>, ConfigValidationError> {
		if let Some(existing) = self.breakers.get(name) {
			return Ok(Arc::clone(existing.value()));
		}

		match self.breakers.entry(name.to_string()) {
			Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
			Entry::Vacant(entry) => {
				let config = config.unwrap_or_else(|| self.config_for(name));
				let breaker = Arc::new(CircuitBreaker::new(
					name,
					config,
					Arc::clone(&self.store),
					self.options.clone(),
					fallback,
				)?);
				debug!(
					breaker = %name,
					fallback = breaker.has_fallback(),
					"Registered circuit breaker"
				);
				entry.insert(Arc::clone(&breaker));
				Ok(breaker)
			},
		}
	}

	pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
		self.breakers.get(name).map(|entry| Arc::clone(entry.value()))
	}

	/// Registered breaker names, sorted
	pub fn names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.breakers.iter().map(|entry| entry.key().clone()).collect();
		names.sort();
		names
	}

	pub fn len(&self) -> usize {
		self.breakers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.breakers.is_empty()
	}

	// map guards must not be held across the store round-trips below
	fn registered(&self) -> Vec<Arc<CircuitBreaker>> {
		self.breakers
			.iter()
			.map(|entry| Arc::clone(entry.value()))
			.collect()
	}

	/// Status of every registered breaker keyed by name
	pub async fn get_all_status(&self) -> BTreeMap<String, CircuitBreakerStatus> {
		let mut statuses = BTreeMap::new();
		for breaker in self.registered() {
			statuses.insert(breaker.name().to_string(), breaker.get_status().await);
		}
		statuses
	}

	/// Reset every registered breaker
	pub async fn reset_all(&self) {
		let breakers = self.registered();
		for breaker in &breakers {
			breaker.reset().await;
		}
		info!("Reset {} circuit breakers", breakers.len());
	}
}

impl fmt::Debug for CircuitBreakerManager {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CircuitBreakerManager")
			.field("defaults", &self.defaults)
			.field("options", &self.options)
			.field("breakers", &self.names())
			.finish_non_exhaustive()
	}
}
