//! Errors surfaced to callers of a circuit breaker

use thiserror::Error;

/// A call was short-circuited and no fallback was registered
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Circuit breaker '{name}' is open")]
pub struct CircuitOpenError {
	pub name: String,
}

impl CircuitOpenError {
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into() }
	}
}

/// Result error of a call made through a circuit breaker.
///
/// `Call` carries the wrapped callable's (or the fallback's) own error
/// untouched; the breaker never translates it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CircuitError<E> {
	#[error(transparent)]
	Open(#[from] CircuitOpenError),

	#[error("{0}")]
	Call(E),
}

impl<E> CircuitError<E> {
	/// Whether the call was rejected by an open circuit
	pub fn is_open(&self) -> bool {
		matches!(self, CircuitError::Open(_))
	}

	/// The wrapped callable's error, if that is what failed
	pub fn into_call_error(self) -> Option<E> {
		match self {
			CircuitError::Call(err) => Some(err),
			CircuitError::Open(_) => None,
		}
	}

	/// Name of the breaker that rejected the call
	pub fn open_breaker(&self) -> Option<&str> {
		match self {
			CircuitError::Open(open) => Some(open.name.as_str()),
			CircuitError::Call(_) => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_open_error_names_the_breaker() {
		let err = CircuitOpenError::new("transcription");
		assert_eq!(err.to_string(), "Circuit breaker 'transcription' is open");
	}

	#[test]
	fn test_call_error_is_passed_through_unchanged() {
		let err: CircuitError<String> = CircuitError::Call("upstream 503".to_string());
		assert!(!err.is_open());
		assert_eq!(err.to_string(), "upstream 503");
		assert_eq!(err.into_call_error(), Some("upstream 503".to_string()));
	}

	#[test]
	fn test_open_variant_from_open_error() {
		let err: CircuitError<std::io::Error> = CircuitOpenError::new("diarization").into();
		assert!(err.is_open());
		assert_eq!(err.open_breaker(), Some("diarization"));
		assert!(err.into_call_error().is_none());
	}
}
