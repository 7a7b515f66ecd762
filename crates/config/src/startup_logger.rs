//! Service startup logging

use crate::settings::{Settings, StorageBackend};
use std::env;
use tracing::info;

/// Logs service information at startup
pub fn log_service_info() {
	let service_name = "tripwire";
	let service_version = env!("CARGO_PKG_VERSION");

	info!("=== Tripwire Circuit Breaker Starting ===");
	info!("Service: {} v{}", service_name, service_version);
	info!("Platform: {} / {}", env::consts::OS, env::consts::ARCH);

	if let Ok(rust_log) = env::var("RUST_LOG") {
		info!("Log Level: {}", rust_log);
	}

	info!(
		"Started at: {}",
		chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
	);
}

/// Logs the effective breaker configuration
pub fn log_settings_summary(settings: &Settings) {
	match settings.storage.backend {
		StorageBackend::Memory => info!("Shared store: in-memory (process local)"),
		StorageBackend::Redis => info!(
			"Shared store: redis via {}",
			settings.storage.redis_url.source()
		),
	}
	info!(
		"Key TTL: {}s, local state cache TTL: {}ms",
		settings.storage.key_ttl_seconds, settings.cache.state_ttl_ms
	);
	info!("Configured breakers: {}", settings.breakers.len());
	for name in settings.breaker_names() {
		let config = settings.breaker_config(&name);
		info!(
			"  - {}: rate>={} over {} (min {}), open {}s, close after {} successes",
			name,
			config.failure_rate_threshold,
			config.window_size,
			config.minimum_request_count,
			config.timeout_seconds,
			config.success_threshold
		);
	}
}

/// Logs startup completion
pub fn log_startup_complete(breaker_count: usize) {
	info!(
		"Tripwire ready with {} registered circuit breaker(s)",
		breaker_count
	);
}

/// Logs service shutdown information
pub fn log_service_shutdown() {
	info!("Tripwire shutting down");
	info!(
		"Shutdown at: {}",
		chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
	);
}
