//! Tripwire Configuration
//!
//! Configuration management and startup utilities.

pub mod loader;
pub mod redis_url;
pub mod settings;
pub mod startup_logger;

pub use loader::{load_config, load_config_from, ConfigLoadError};
pub use redis_url::{RedisUrl, RedisUrlError};
pub use settings::{
	CacheSettings, LogFormat, LoggingSettings, Settings, SettingsValidationError,
	StorageBackend, StorageSettings,
};
pub use startup_logger::{
	log_service_info, log_service_shutdown, log_settings_summary, log_startup_complete,
};
