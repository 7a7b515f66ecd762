//! Configuration settings structures

use crate::redis_url::RedisUrl;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tripwire_types::{CircuitBreakerConfig, ConfigValidationError};

/// Main application settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
	pub logging: LoggingSettings,
	pub storage: StorageSettings,
	pub cache: CacheSettings,
	/// Config used for breakers created without an explicit one
	pub defaults: CircuitBreakerConfig,
	/// Per-dependency overrides, registered at startup
	pub breakers: HashMap<String, CircuitBreakerConfig>,
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
	pub level: String,
	pub format: LogFormat,
	pub structured: bool,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			format: LogFormat::Pretty,
			structured: false,
		}
	}
}

/// Log format options
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	Json,
	Pretty,
	Compact,
}

/// Which shared store backs the breakers
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
	/// Process-local; breakers are not shared between processes
	Memory,
	Redis,
}

/// Shared store configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct StorageSettings {
	pub backend: StorageBackend,
	pub redis_url: RedisUrl,
	/// TTL applied to every breaker key so abandoned breakers expire
	pub key_ttl_seconds: u64,
	/// How often the memory backend sweeps expired keys
	pub cleanup_interval_seconds: u64,
}

impl Default for StorageSettings {
	fn default() -> Self {
		Self {
			backend: StorageBackend::Memory,
			redis_url: RedisUrl::default(),
			key_ttl_seconds: 3600,
			cleanup_interval_seconds: 60,
		}
	}
}

impl StorageSettings {
	pub fn key_ttl(&self) -> Duration {
		Duration::from_secs(self.key_ttl_seconds)
	}

	pub fn cleanup_interval(&self) -> Duration {
		Duration::from_secs(self.cleanup_interval_seconds.max(1))
	}
}

/// Local state cache configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CacheSettings {
	/// How long a process trusts its cached view of a breaker's state
	pub state_ttl_ms: u64,
}

impl Default for CacheSettings {
	fn default() -> Self {
		Self { state_ttl_ms: 5000 }
	}
}

impl CacheSettings {
	pub fn state_ttl(&self) -> Duration {
		Duration::from_millis(self.state_ttl_ms)
	}
}

/// A breaker config that failed validation, with the breaker it belongs to
#[derive(Debug, thiserror::Error)]
#[error("Invalid circuit breaker config '{name}': {source}")]
pub struct SettingsValidationError {
	pub name: String,
	#[source]
	pub source: ConfigValidationError,
}

impl Settings {
	/// Validate the default breaker config and every override
	pub fn validate(&self) -> Result<(), SettingsValidationError> {
		self.defaults
			.validate()
			.map_err(|source| SettingsValidationError {
				name: "defaults".to_string(),
				source,
			})?;
		for (name, config) in &self.breakers {
			config.validate().map_err(|source| SettingsValidationError {
				name: name.clone(),
				source,
			})?;
		}
		Ok(())
	}

	/// Config for `name`: its override if one exists, else the defaults
	pub fn breaker_config(&self, name: &str) -> CircuitBreakerConfig {
		self.breakers
			.get(name)
			.cloned()
			.unwrap_or_else(|| self.defaults.clone())
	}

	/// Configured breaker names, sorted for stable output
	pub fn breaker_names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.breakers.keys().cloned().collect();
		names.sort();
		names
	}
}
