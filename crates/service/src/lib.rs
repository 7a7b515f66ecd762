//! Tripwire Service
//!
//! Circuit breaker state machine, sliding window, fallbacks and the
//! per-process breaker registry.

pub mod circuit_breaker;
pub mod fallback;
pub mod guard;
pub mod invocable;
pub mod manager;
mod metrics;
pub mod window;

pub use circuit_breaker::{BreakerOptions, CircuitBreaker};
pub use fallback::Fallback;
pub use guard::CallGuard;
pub use invocable::{direct, suspending, Direct, Invocable, Suspending};
pub use manager::CircuitBreakerManager;
pub use window::failure_rate;
