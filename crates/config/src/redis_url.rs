//! Where the Redis connection string comes from
//!
//! The URL usually carries a password, so the default points at the
//! `REDIS_URL` environment variable instead of a literal in the config file.
//! In TOML either form is a small table:
//!
//! ```toml
//! [storage.redis_url]
//! type = "env"      # or "plain"
//! value = "REDIS_URL"
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum RedisUrl {
	/// Name of the environment variable holding the URL
	Env(String),
	/// The URL itself
	Plain(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RedisUrlError {
	#[error("redis url variable '{0}' is not set")]
	Unset(String),
	#[error("redis url variable '{0}' is empty")]
	Empty(String),
}

impl Default for RedisUrl {
	fn default() -> Self {
		RedisUrl::Env("REDIS_URL".to_string())
	}
}

impl RedisUrl {
	/// The connection string, read from the environment for `Env`
	pub fn resolve(&self) -> Result<String, RedisUrlError> {
		match self {
			RedisUrl::Plain(url) => Ok(url.clone()),
			RedisUrl::Env(var) => match std::env::var(var) {
				Ok(url) if url.trim().is_empty() => Err(RedisUrlError::Empty(var.clone())),
				Ok(url) => Ok(url),
				Err(_) => Err(RedisUrlError::Unset(var.clone())),
			},
		}
	}

	/// Names the source without exposing the URL
	pub fn source(&self) -> String {
		match self {
			RedisUrl::Env(var) => format!("${}", var),
			RedisUrl::Plain(_) => "inline url".to_string(),
		}
	}
}

// Inline URLs may embed credentials
impl fmt::Display for RedisUrl {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RedisUrl::Env(var) => write!(f, "env:{}", var),
			RedisUrl::Plain(_) => f.write_str("plain:[REDACTED]"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::env;

	#[test]
	fn test_default_reads_redis_url_variable() {
		assert_eq!(RedisUrl::default(), RedisUrl::Env("REDIS_URL".to_string()));
		assert_eq!(RedisUrl::default().source(), "$REDIS_URL");
	}

	#[test]
	fn test_plain_url_resolves_as_is() {
		let url = RedisUrl::Plain("redis://cache:6379".to_string());
		assert_eq!(url.resolve().unwrap(), "redis://cache:6379");
	}

	#[test]
	fn test_env_url_resolution() {
		env::set_var("TRIPWIRE_TEST_REDIS_URL", "redis://from-env:6379");
		env::set_var("TRIPWIRE_TEST_BLANK_REDIS_URL", "  ");

		let set = RedisUrl::Env("TRIPWIRE_TEST_REDIS_URL".to_string());
		assert_eq!(set.resolve().unwrap(), "redis://from-env:6379");

		let blank = RedisUrl::Env("TRIPWIRE_TEST_BLANK_REDIS_URL".to_string());
		assert!(matches!(blank.resolve(), Err(RedisUrlError::Empty(_))));

		let unset = RedisUrl::Env("TRIPWIRE_TEST_UNSET_REDIS_URL".to_string());
		assert!(matches!(unset.resolve(), Err(RedisUrlError::Unset(name)) if name == "TRIPWIRE_TEST_UNSET_REDIS_URL"));

		env::remove_var("TRIPWIRE_TEST_REDIS_URL");
		env::remove_var("TRIPWIRE_TEST_BLANK_REDIS_URL");
	}

	#[test]
	fn test_display_hides_inline_credentials() {
		let inline = RedisUrl::Plain("redis://:hunter2@cache:6379".to_string());
		assert_eq!(inline.to_string(), "plain:[REDACTED]");
		assert!(!inline.source().contains("hunter2"));

		assert_eq!(RedisUrl::Env("CACHE_URL".to_string()).to_string(), "env:CACHE_URL");
	}

	#[test]
	fn test_table_form_round_trips() {
		let json = serde_json::to_string(&RedisUrl::default()).unwrap();
		assert_eq!(json, r#"{"type":"env","value":"REDIS_URL"}"#);

		let plain: RedisUrl =
			serde_json::from_str(r#"{"type":"plain","value":"redis://cache:6379"}"#).unwrap();
		assert_eq!(plain, RedisUrl::Plain("redis://cache:6379".to_string()));
	}
}
