//! Tests for the Builder Pattern implementation

use std::collections::HashMap;
use std::sync::Arc;
use tripwire::config::Settings;
use tripwire::{
	direct, BuildError, CircuitBreakerConfig, CircuitState, Fallback, MemoryStore, SharedStore,
	StorageError, TripwireBuilder,
};
use tripwire_types::MockSharedStore;

mod mocks;
use mocks::CircuitBreakerConfigs;

/// Create settings with two configured breakers
fn create_test_settings() -> Settings {
	let mut settings = Settings::default();
	settings.cache.state_ttl_ms = 0;
	settings.breakers = HashMap::from([
		("payments".to_string(), CircuitBreakerConfigs::sensitive()),
		(
			"search".to_string(),
			CircuitBreakerConfig {
				timeout_seconds: 5.0,
				..Default::default()
			},
		),
	]);
	settings
}

#[tokio::test]
async fn test_builder_defaults() {
	let manager = TripwireBuilder::new().build().await.unwrap();

	assert!(manager.is_empty());
	assert_eq!(manager.options().key_ttl.as_secs(), 3600);
	assert_eq!(manager.options().state_cache_ttl.as_millis(), 5000);

	let breaker = manager.get_or_create("anything", None, None).unwrap();
	assert_eq!(breaker.config(), &CircuitBreakerConfig::default());
}

#[tokio::test]
async fn test_builder_registers_configured_breakers() {
	let manager = TripwireBuilder::new()
		.with_settings(create_test_settings())
		.build()
		.await
		.unwrap();

	assert_eq!(manager.names(), vec!["payments", "search"]);
	let payments = manager.get("payments").unwrap();
	assert_eq!(payments.config(), &CircuitBreakerConfigs::sensitive());
	assert_eq!(manager.get("search").unwrap().config().timeout_seconds, 5.0);

	// later lookups return the registered instance
	let again = manager.get_or_create("payments", None, None).unwrap();
	assert!(Arc::ptr_eq(&payments, &again));
}

#[tokio::test]
async fn test_builder_attaches_fallbacks() {
	let fallback = Fallback::new(direct(|id: u64| Ok::<String, String>(format!("stub-{}", id))));
	let manager = TripwireBuilder::new()
		.with_settings(create_test_settings())
		.with_fallback("payments", fallback.clone())
		.with_fallback("profiles", fallback)
		.build()
		.await
		.unwrap();

	assert!(manager.get("payments").unwrap().has_fallback());
	assert!(!manager.get("search").unwrap().has_fallback());
	// fallbacks for unconfigured names register the breaker with defaults
	let profiles = manager.get("profiles").unwrap();
	assert!(profiles.has_fallback());
	assert_eq!(profiles.config(), &CircuitBreakerConfig::default());
}

#[tokio::test]
async fn test_builder_uses_provided_store() {
	let store = MemoryStore::new();
	let manager = TripwireBuilder::with_storage(store.clone())
		.with_settings(create_test_settings())
		.build()
		.await
		.unwrap();

	let breaker = manager.get("payments").unwrap();
	let failing = direct(|_: ()| Err::<(), String>("down".to_string()));
	for _ in 0..5 {
		let _ = breaker.call(&failing, ()).await;
	}

	assert_eq!(breaker.state().await, CircuitState::Open);
	assert!(store.get("circuit_breaker:payments").await.unwrap().is_some());
}

#[tokio::test]
async fn test_builder_rejects_invalid_breaker_config() {
	let mut settings = create_test_settings();
	settings.breakers.insert(
		"broken".to_string(),
		CircuitBreakerConfig {
			failure_rate_threshold: 0.0,
			..Default::default()
		},
	);

	let err = TripwireBuilder::new()
		.with_settings(settings)
		.build()
		.await
		.unwrap_err();
	match err {
		BuildError::InvalidSettings(invalid) => assert_eq!(invalid.name, "broken"),
		other => panic!("unexpected error: {}", other),
	}
}

#[tokio::test]
async fn test_builder_fails_on_unhealthy_store() {
	let mut store = MockSharedStore::new();
	store.expect_health_check().returning(|| Ok(false));

	let err = TripwireBuilder::with_storage(store).build().await.unwrap_err();
	assert!(matches!(err, BuildError::Unhealthy));
}

#[tokio::test]
async fn test_builder_surfaces_store_errors() {
	let mut store = MockSharedStore::new();
	store.expect_health_check().returning(|| {
		Err(StorageError::Connection {
			message: "connection refused".to_string(),
		})
	});

	let err = TripwireBuilder::with_storage(store).build().await.unwrap_err();
	assert!(matches!(err, BuildError::Storage(StorageError::Connection { .. })));
}

#[cfg(not(feature = "redis"))]
#[tokio::test]
async fn test_redis_backend_requires_feature() {
	let mut settings = Settings::default();
	settings.storage.backend = tripwire::config::StorageBackend::Redis;

	let err = TripwireBuilder::new()
		.with_settings(settings)
		.build()
		.await
		.unwrap_err();
	assert!(matches!(err, BuildError::RedisUnavailable));
}
