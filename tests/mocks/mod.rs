//! Shared fixtures for the integration tests
//!
//! A "process" in these tests is a [`CircuitBreakerManager`]; two managers
//! built over clones of one `MemoryStore` behave like two replicas sharing
//! a networked store.

pub mod configs;
pub mod dependencies;

#[allow(unused_imports)]
pub use configs::CircuitBreakerConfigs;
#[allow(unused_imports)]
pub use dependencies::FlakyDependency;
