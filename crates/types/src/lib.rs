//! Tripwire Types
//!
//! Shared models and traits for the Tripwire circuit breaker.
//! This crate holds the value types persisted in the shared store, the
//! error taxonomy surfaced to callers, and the store abstraction itself.

pub mod circuit_breaker;
pub mod storage;

// Re-export chrono and serde_json for convenience
pub use chrono;
pub use serde_json;

pub use circuit_breaker::{
	epoch_seconds, CircuitBreakerConfig, CircuitBreakerStatus, CircuitError, CircuitMetrics,
	CircuitOpenError, CircuitState, ConfigValidationError, StoredCircuit, WindowEntry,
	WindowEntryParseError,
};

pub use storage::{SharedStore, StorageError, StorageResult};

#[cfg(any(test, feature = "test-utils"))]
pub use storage::MockSharedStore;
