//! Callables a circuit breaker can wrap
//!
//! The breaker only ever sees an [`Invocable`]: something that takes an
//! argument value and eventually yields a `Result`. Call sites pick the
//! adapter matching what they have, a plain function ([`Direct`]) or one
//! returning a future ([`Suspending`]), so the breaker's state machine does
//! not care which kind it is protecting.

use async_trait::async_trait;
use std::future::Future;

/// A protected operation taking `A` and producing `Result<Output, Error>`
#[async_trait]
pub trait Invocable<A>: Send + Sync
where
	A: Send + 'static,
{
	type Output: Send + 'static;
	type Error: Send + 'static;

	async fn invoke(&self, args: A) -> Result<Self::Output, Self::Error>;
}

/// Adapter for synchronous functions, run inline on the calling task
#[derive(Debug, Clone, Copy)]
pub struct Direct<F>(F);

impl<F> Direct<F> {
	pub fn new(f: F) -> Self {
		Self(f)
	}
}

#[async_trait]
impl<A, F, T, E> Invocable<A> for Direct<F>
where
	A: Send + 'static,
	F: Fn(A) -> Result<T, E> + Send + Sync + 'static,
	T: Send + 'static,
	E: Send + 'static,
{
	type Output = T;
	type Error = E;

	async fn invoke(&self, args: A) -> Result<T, E> {
		(self.0)(args)
	}
}

/// Adapter for functions returning a future, awaited without blocking the executor
#[derive(Debug, Clone, Copy)]
pub struct Suspending<F>(F);

impl<F> Suspending<F> {
	pub fn new(f: F) -> Self {
		Self(f)
	}
}

#[async_trait]
impl<A, F, Fut, T, E> Invocable<A> for Suspending<F>
where
	A: Send + 'static,
	F: Fn(A) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<T, E>> + Send + 'static,
	T: Send + 'static,
	E: Send + 'static,
{
	type Output = T;
	type Error = E;

	async fn invoke(&self, args: A) -> Result<T, E> {
		(self.0)(args).await
	}
}

/// Wrap a synchronous function
pub fn direct<F>(f: F) -> Direct<F> {
	Direct::new(f)
}

/// Wrap a function returning a future
pub fn suspending<F>(f: F) -> Suspending<F> {
	Suspending::new(f)
}
