//! Type-erased fallback handlers
//!
//! A breaker is registered once per dependency name and is then used by call
//! sites with their own argument and result types. The fallback is stored
//! erased and recovered at call time for the call's `(A, T, E)` signature.

use crate::invocable::Invocable;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

type Handler<A, T, E> = Arc<dyn Invocable<A, Output = T, Error = E>>;

/// Substitute behaviour invoked with the caller's arguments while a circuit is open
#[derive(Clone)]
pub struct Fallback {
	handler: Arc<dyn Any + Send + Sync>,
	signature: &'static str,
}

impl Fallback {
	pub fn new<A, I>(invocable: I) -> Self
	where
		A: Send + 'static,
		I: Invocable<A> + 'static,
	{
		let handler: Handler<A, I::Output, I::Error> = Arc::new(invocable);
		Self {
			handler: Arc::new(handler),
			signature: signature_of::<A, I::Output, I::Error>(),
		}
	}

	/// Human-readable `fn(A) -> Result<T, E>` signature this fallback accepts
	pub fn signature(&self) -> &'static str {
		self.signature
	}

	/// The handler if it was registered for exactly this signature
	pub(crate) fn resolve<A, T, E>(&self) -> Option<Handler<A, T, E>>
	where
		A: Send + 'static,
		T: Send + 'static,
		E: Send + 'static,
	{
		self.handler.downcast_ref::<Handler<A, T, E>>().cloned()
	}
}

pub(crate) fn signature_of<A, T, E>() -> &'static str {
	type_name::<fn(A) -> Result<T, E>>()
}

impl fmt::Debug for Fallback {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Fallback")
			.field("signature", &self.signature)
			.finish()
	}
}
