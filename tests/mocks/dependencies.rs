//! Fake downstream dependencies

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tripwire::{suspending, Invocable};

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
#[error("dependency unavailable: {request}")]
pub struct Unavailable {
	pub request: String,
}

/// An async dependency whose health can be flipped at runtime
#[derive(Clone)]
pub struct FlakyDependency {
	healthy: Arc<AtomicBool>,
	calls: Arc<AtomicUsize>,
	latency: Duration,
}

impl FlakyDependency {
	pub fn healthy() -> Self {
		Self {
			healthy: Arc::new(AtomicBool::new(true)),
			calls: Arc::new(AtomicUsize::new(0)),
			latency: Duration::from_millis(1),
		}
	}

	pub fn failing() -> Self {
		let dependency = Self::healthy();
		dependency.set_healthy(false);
		dependency
	}

	pub fn set_healthy(&self, healthy: bool) {
		self.healthy.store(healthy, Ordering::SeqCst);
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	/// The dependency as something a breaker can call
	pub fn endpoint(&self) -> impl Invocable<String, Output = String, Error = Unavailable> {
		let healthy = Arc::clone(&self.healthy);
		let calls = Arc::clone(&self.calls);
		let latency = self.latency;

		suspending(move |request: String| {
			let healthy = healthy.load(Ordering::SeqCst);
			calls.fetch_add(1, Ordering::SeqCst);
			async move {
				tokio::time::sleep(latency).await;
				if healthy {
					Ok(format!("handled {}", request))
				} else {
					Err(Unavailable { request })
				}
			}
		})
	}
}
