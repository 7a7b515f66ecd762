//! Configuration loading utilities

use crate::settings::SettingsValidationError;
use crate::Settings;
use config::{Config, ConfigError, Environment, File};

/// Errors raised while loading settings
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
	#[error("Failed to load configuration: {0}")]
	Load(#[from] ConfigError),

	#[error(transparent)]
	Invalid(#[from] SettingsValidationError),
}

/// Load configuration from `config/config.*` (optional) and `TRIPWIRE__*` env vars
pub fn load_config() -> Result<Settings, ConfigLoadError> {
	load_config_from("config/config")
}

/// Load configuration from the given file stem (optional) and `TRIPWIRE__*` env vars
pub fn load_config_from(path: &str) -> Result<Settings, ConfigLoadError> {
	let s = Config::builder()
		.add_source(File::with_name(path).required(false))
		.add_source(
			Environment::with_prefix("TRIPWIRE")
				.prefix_separator("__")
				.separator("__")
				.try_parsing(true),
		)
		.build()?;

	let settings: Settings = s.try_deserialize()?;
	settings.validate()?;
	Ok(settings)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_missing_file_yields_defaults() {
		let settings = load_config_from("does/not/exist").expect("defaults should load");
		assert_eq!(settings.storage.key_ttl_seconds, 3600);
		assert!(settings.breakers.is_empty());
	}
}
