//! Tripwire
//!
//! A distributed circuit breaker. Every process protecting the same
//! downstream dependency shares one breaker state through a shared store, so
//! a dependency that fails for one replica is short-circuited for all of them.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

// Core types
pub use tripwire_types::{
	chrono,
	// External dependencies for convenience
	serde_json,
	CircuitBreakerConfig,
	CircuitBreakerStatus,
	CircuitError,
	CircuitMetrics,
	CircuitOpenError,
	CircuitState,
	ConfigValidationError,
	SharedStore,
	StorageError,
	StorageResult,
};

// Service layer
pub use tripwire_service::{
	direct, suspending, BreakerOptions, CallGuard, CircuitBreaker, CircuitBreakerManager, Direct,
	Fallback, Invocable, Suspending,
};

// Storage layer
pub use tripwire_storage::MemoryStore;
#[cfg(feature = "redis")]
pub use tripwire_storage::RedisStore;

// Config
pub use tripwire_config::{
	load_config, log_service_info, log_service_shutdown, log_startup_complete, Settings,
};

pub mod config {
	pub use tripwire_config::*;
}

pub mod storage {
	pub use tripwire_storage::*;
}

pub mod service {
	pub use tripwire_service::*;
}

/// Errors raised while assembling a manager from settings
#[derive(Debug, Error)]
pub enum BuildError {
	#[error(transparent)]
	InvalidSettings(#[from] tripwire_config::SettingsValidationError),

	#[error("Invalid configuration for breaker '{name}': {source}")]
	InvalidBreaker {
		name: String,
		#[source]
		source: ConfigValidationError,
	},

	#[error("Failed to resolve redis url: {0}")]
	RedisUrl(#[from] tripwire_config::RedisUrlError),

	#[error("Redis backend selected but tripwire was built without the `redis` feature")]
	RedisUnavailable,

	#[error("Shared store unavailable: {0}")]
	Storage(#[from] StorageError),

	#[error("Shared store failed its health check")]
	Unhealthy,
}

/// Builder pattern for configuring a breaker manager
#[derive(Default)]
pub struct TripwireBuilder {
	settings: Option<Settings>,
	store: Option<Arc<dyn SharedStore>>,
	fallbacks: HashMap<String, Fallback>,
}

impl TripwireBuilder {
	/// Create a new builder; the store is picked from settings at build time
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a builder using the provided store instead of the configured backend
	pub fn with_storage<S>(store: S) -> Self
	where
		S: SharedStore + 'static,
	{
		Self::new().with_shared_store(Arc::new(store))
	}

	pub fn with_shared_store(mut self, store: Arc<dyn SharedStore>) -> Self {
		self.store = Some(store);
		self
	}

	/// Set custom settings
	pub fn with_settings(mut self, settings: Settings) -> Self {
		self.settings = Some(settings);
		self
	}

	/// Register a fallback for the breaker called `name`
	pub fn with_fallback(mut self, name: impl Into<String>, fallback: Fallback) -> Self {
		self.fallbacks.insert(name.into(), fallback);
		self
	}

	/// Get the current settings
	pub fn settings(&self) -> Option<&Settings> {
		self.settings.as_ref()
	}

	/// Connect the store the settings ask for
	async fn connect_store(
		settings: &tripwire_config::StorageSettings,
	) -> Result<Arc<dyn SharedStore>, BuildError> {
		use tripwire_config::StorageBackend;

		match settings.backend {
			StorageBackend::Memory => {
				let store = MemoryStore::new();
				store.start_ttl_cleanup(settings.cleanup_interval());
				Ok(Arc::new(store))
			},
			#[cfg(feature = "redis")]
			StorageBackend::Redis => {
				let url = settings.redis_url.resolve()?;
				let store = RedisStore::connect(&url).await?;
				Ok(Arc::new(store))
			},
			#[cfg(not(feature = "redis"))]
			StorageBackend::Redis => Err(BuildError::RedisUnavailable),
		}
	}

	/// Assemble the manager and register every configured breaker
	pub async fn build(self) -> Result<Arc<CircuitBreakerManager>, BuildError> {
		let settings = self.settings.unwrap_or_default();
		settings.validate()?;

		let store = match self.store {
			Some(store) => store,
			None => Self::connect_store(&settings.storage).await?,
		};
		if !store.health_check().await? {
			return Err(BuildError::Unhealthy);
		}

		let options = BreakerOptions {
			key_ttl: settings.storage.key_ttl(),
			state_cache_ttl: settings.cache.state_ttl(),
		};
		let manager =
			CircuitBreakerManager::with_defaults(store, settings.defaults.clone(), options)
				.with_overrides(settings.breakers.clone());

		let mut fallbacks = self.fallbacks;
		let mut names = settings.breaker_names();
		for name in fallbacks.keys() {
			if !names.contains(name) {
				names.push(name.clone());
			}
		}
		for name in names {
			let fallback = fallbacks.remove(&name);
			manager
				.get_or_create(&name, None, fallback)
				.map_err(|source| BuildError::InvalidBreaker {
					name: name.clone(),
					source,
				})?;
		}

		Ok(Arc::new(manager))
	}

	/// Initialize tracing with configuration-based settings
	fn init_tracing_from_settings(
		&self,
		settings: &Settings,
	) -> Result<(), Box<dyn std::error::Error>> {
		use tripwire_config::LogFormat;

		// Create env filter using config level or environment variable
		let log_level = &settings.logging.level;
		let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
			.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

		let result = match settings.logging.format {
			LogFormat::Json => {
				let subscriber = tracing_subscriber::fmt().json().with_env_filter(env_filter);

				if settings.logging.structured {
					subscriber.with_target(true).with_thread_ids(true).try_init()
				} else {
					subscriber.try_init()
				}
			},
			LogFormat::Pretty => {
				let subscriber = tracing_subscriber::fmt()
					.pretty()
					.with_env_filter(env_filter);

				if settings.logging.structured {
					subscriber.with_target(true).with_thread_ids(true).try_init()
				} else {
					subscriber.try_init()
				}
			},
			LogFormat::Compact => {
				let subscriber = tracing_subscriber::fmt()
					.compact()
					.with_env_filter(env_filter);

				if settings.logging.structured {
					subscriber.with_target(true).with_thread_ids(true).try_init()
				} else {
					subscriber.try_init()
				}
			},
		};
		result.map_err(|e| format!("Failed to initialize logging: {}", e))?;

		info!(
			"Logging configuration applied: level={}, format={:?}, structured={}",
			settings.logging.level, settings.logging.format, settings.logging.structured
		);

		Ok(())
	}

	/// Full startup for a process:
	/// - Loading .env file
	/// - Loading configuration (provided settings win)
	/// - Initializing tracing
	/// - Connecting the store and registering configured breakers
	pub async fn start(mut self) -> Result<Arc<CircuitBreakerManager>, Box<dyn std::error::Error>> {
		// Load .env file if it exists
		dotenvy::dotenv().ok();

		let using_provided_settings = self.settings.is_some();
		let settings = match self.settings.take() {
			Some(settings) => settings,
			None => load_config()?,
		};

		self.init_tracing_from_settings(&settings)?;
		log_service_info();
		info!(
			"Using configuration: loaded from {}",
			if using_provided_settings {
				"provided settings"
			} else {
				"config file or defaults"
			}
		);
		tripwire_config::log_settings_summary(&settings);

		let manager = self.with_settings(settings).build().await?;
		log_startup_complete(manager.len());

		Ok(manager)
	}
}
